use backend_domain::{AttendanceState, Event, EventId, IdentityProvider, JoinRecord};

use crate::commands::caller;
use crate::{AppError, AppState, NotFoundKind};

pub async fn get_event(state: &AppState, event_id: &EventId) -> Result<Event, AppError> {
    let result = require_event(state, event_id).await;
    state.observe("get_event", result)
}

/// The caller's own attendance state for `event_id`.
pub async fn attendance_state(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceState, AppError> {
    let result: Result<AttendanceState, AppError> = async {
        let user_id = caller(identity)?;
        require_event(state, event_id).await?;
        let record = state.records().join(&user_id, event_id).await?;
        Ok(AttendanceState::of(record.as_ref())?)
    }
    .await;
    state.observe("attendance_state", result)
}

pub async fn list_attendees(
    state: &AppState,
    event_id: &EventId,
) -> Result<Vec<JoinRecord>, AppError> {
    let result: Result<Vec<JoinRecord>, AppError> = async {
        require_event(state, event_id).await?;
        Ok(state.records().joins_for_event(event_id).await?)
    }
    .await;
    state.observe("list_attendees", result)
}

pub(crate) async fn require_event(state: &AppState, event_id: &EventId) -> Result<Event, AppError> {
    state
        .records()
        .event(event_id)
        .await?
        .ok_or(AppError::NotFound(NotFoundKind::Event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::attendance_commands::{check_in, join_event};
    use crate::testing::{as_user, fixture, seed_event};
    use chrono::Duration;

    #[tokio::test]
    async fn attendance_state_tracks_the_caller() {
        let fixture = fixture();
        let event = seed_event(&fixture, "org-1", None).await;
        let alice = as_user("alice");

        let before = attendance_state(&fixture.state, &alice, &event.id).await.expect("state");
        assert_eq!(before, AttendanceState::NotJoined);

        join_event(&fixture.state, &alice, &event.id).await.expect("join");
        fixture.clock.advance(Duration::minutes(3));
        check_in(&fixture.state, &alice, &event.id).await.expect("check in");
        let after = attendance_state(&fixture.state, &alice, &event.id).await.expect("state");
        assert_eq!(after.as_str(), "checked_in");

        let other = attendance_state(&fixture.state, &as_user("bob"), &event.id)
            .await
            .expect("state");
        assert_eq!(other, AttendanceState::NotJoined);
    }

    #[tokio::test]
    async fn attendees_are_ordered_by_join_time() {
        let fixture = fixture();
        let event = seed_event(&fixture, "org-1", None).await;
        for user in ["zed", "amy"] {
            fixture.clock.advance(Duration::minutes(1));
            join_event(&fixture.state, &as_user(user), &event.id).await.expect("join");
        }
        let attendees = list_attendees(&fixture.state, &event.id).await.expect("attendees");
        let users: Vec<&str> = attendees.iter().map(|join| join.user_id.as_str()).collect();
        assert_eq!(users, vec!["zed", "amy"]);

        let err = get_event(&fixture.state, &EventId::from("missing"))
            .await
            .expect_err("missing");
        assert!(matches!(err, AppError::NotFound(NotFoundKind::Event)));
    }
}
