// Shared fixtures for the async command and query tests

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use backend_domain::{Clock, Event, NewEvent, RuntimeConfig, UserId};
use backend_infrastructure::{ManualClock, MemoryRecordStore, StaticIdentity};

use crate::commands::event_commands;
use crate::AppState;

pub(crate) struct Fixture {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
}

/// Monday 2026-03-02 09:00 UTC.
pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub(crate) fn fixture() -> Fixture {
    fixture_with(RuntimeConfig {
        qr_secret: Some("qr-secret".to_string()),
        admin_users: vec![UserId::from("admin")],
        ..RuntimeConfig::default()
    })
}

pub(crate) fn fixture_with(config: RuntimeConfig) -> Fixture {
    let clock = Arc::new(ManualClock::new(start()));
    let state = AppState::new(config, Arc::new(MemoryRecordStore::new()), clock.clone())
        .expect("state");
    Fixture { state, clock }
}

pub(crate) fn as_user(id: &str) -> StaticIdentity {
    StaticIdentity::user(UserId::from(id))
}

pub(crate) async fn seed_event(fixture: &Fixture, creator: &str, capacity: Option<u32>) -> Event {
    let now = fixture.clock.now();
    event_commands::create_event(
        &fixture.state,
        &as_user(creator),
        NewEvent {
            title: "Food bank shift".to_string(),
            description: "Sorting donations".to_string(),
            cause: Some("Food Security".to_string()),
            starts_at: now,
            ends_at: now + Duration::hours(3),
            location: None,
            capacity,
            organization_id: None,
        },
    )
    .await
    .expect("create event")
}
