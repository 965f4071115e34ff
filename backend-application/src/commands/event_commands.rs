use tracing::info;

use backend_domain::{
    to_row, CauseCategory, Collection, Event, EventId, IdentityProvider, NewEvent,
};

use crate::commands::caller;
use crate::{AppError, AppState};

pub async fn create_event(
    state: &AppState,
    identity: &dyn IdentityProvider,
    payload: NewEvent,
) -> Result<Event, AppError> {
    state.observe("create_event", try_create_event(state, identity, payload).await)
}

async fn try_create_event(
    state: &AppState,
    identity: &dyn IdentityProvider,
    payload: NewEvent,
) -> Result<Event, AppError> {
    let creator = caller(identity)?;
    let normalized = payload.normalized();
    validate_new_event(&normalized)?;

    let event = Event {
        id: EventId::generate(),
        title: normalized.title,
        description: normalized.description,
        cause: normalized
            .cause
            .as_deref()
            .map(CauseCategory::from)
            .unwrap_or(CauseCategory::Other),
        starts_at: normalized.starts_at,
        ends_at: normalized.ends_at,
        location: normalized.location,
        capacity: normalized.capacity,
        organization_id: normalized.organization_id,
        created_by: creator,
        created_at: state.now(),
    };
    state
        .store
        .insert(Collection::Events, to_row(Collection::Events, &event)?)
        .await?;
    info!(
        event_id = %event.id,
        created_by = %event.created_by,
        cause = %event.cause,
        "event created"
    );
    Ok(event)
}

fn validate_new_event(event: &NewEvent) -> Result<(), AppError> {
    if event.title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if event.starts_at >= event.ends_at {
        return Err(AppError::Validation(
            "starts_at must be before ends_at".to_string(),
        ));
    }
    if event.capacity == Some(0) {
        return Err(AppError::Validation(
            "capacity must be greater than 0".to_string(),
        ));
    }
    if let Some(location) = event.location {
        if !(-90.0..=90.0).contains(&location.latitude)
            || !(-180.0..=180.0).contains(&location.longitude)
        {
            return Err(AppError::Validation(
                "location is out of range".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{as_user, fixture, start};
    use backend_infrastructure::StaticIdentity;
    use chrono::Duration;

    fn new_event(title: &str) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: String::new(),
            cause: None,
            starts_at: start(),
            ends_at: start() + Duration::hours(2),
            location: None,
            capacity: None,
            organization_id: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn creates_event_owned_by_caller() {
        let fixture = fixture();
        let mut payload = new_event("  Beach cleanup ");
        payload.cause = Some("ENVIRONMENT".to_string());
        let event = create_event(&fixture.state, &as_user("org-1"), payload)
            .await
            .expect("create");
        assert_eq!(event.title, "Beach cleanup");
        assert_eq!(event.cause, CauseCategory::Environment);
        assert_eq!(event.created_by.as_str(), "org-1");
        assert_eq!(event.organization_id, None);

        let stored = fixture.state.records().event(&event.id).await.expect("read");
        assert_eq!(stored, Some(event));
    }

    #[tokio::test]
    async fn rejects_invalid_events() {
        let fixture = fixture();
        let err = create_event(&fixture.state, &as_user("org-1"), new_event("  "))
            .await
            .expect_err("blank title");
        assert!(matches!(err, AppError::Validation(_)));

        let mut inverted = new_event("Shift");
        inverted.ends_at = inverted.starts_at;
        let err = create_event(&fixture.state, &as_user("org-1"), inverted)
            .await
            .expect_err("empty window");
        assert!(matches!(err, AppError::Validation(_)));

        let mut full = new_event("Shift");
        full.capacity = Some(0);
        assert!(create_event(&fixture.state, &as_user("org-1"), full).await.is_err());

        let err = create_event(&fixture.state, &StaticIdentity::anonymous(), new_event("Shift"))
            .await
            .expect_err("anonymous");
        assert!(matches!(err, AppError::Unauthenticated));
    }
}
