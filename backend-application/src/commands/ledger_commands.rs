use tracing::info;

use backend_domain::{
    to_row, AwardRequest, Collection, IdentityProvider, LedgerEntry, PointsReason, UserId,
};

use crate::commands::caller;
use crate::{AppError, AppState, NotFoundKind};

/// Appends an administrative entry. Transition awards go through the
/// attendance commands instead.
///
/// Configured admins may award anyone. An event's creator may award other
/// users against that event. Everyone else gets `Forbidden`.
pub async fn award_points(
    state: &AppState,
    identity: &dyn IdentityProvider,
    request: AwardRequest,
) -> Result<LedgerEntry, AppError> {
    state.observe("award_points", try_award(state, identity, request).await)
}

async fn try_award(
    state: &AppState,
    identity: &dyn IdentityProvider,
    request: AwardRequest,
) -> Result<LedgerEntry, AppError> {
    let actor = caller(identity)?;
    if request.user_id.as_str().trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    if matches!(
        request.reason,
        PointsReason::EventCheckin | PointsReason::EventCheckout
    ) {
        return Err(AppError::Validation(format!(
            "reason {} is reserved for attendance transitions",
            request.reason.as_str()
        )));
    }
    ensure_may_award(state, &actor, &request).await?;

    let entry = LedgerEntry::new(
        request.user_id,
        request.amount,
        request.reason,
        request.event_id,
        state.now(),
    )?;
    state
        .store
        .insert(
            Collection::PointsLedger,
            to_row(Collection::PointsLedger, &entry)?,
        )
        .await?;
    state.metrics.record_ledger_entry();
    info!(
        user_id = %entry.user_id,
        awarded_by = %actor,
        amount = entry.amount,
        reason = entry.reason.as_str(),
        "ledger entry appended"
    );
    Ok(entry)
}

async fn ensure_may_award(
    state: &AppState,
    actor: &UserId,
    request: &AwardRequest,
) -> Result<(), AppError> {
    let event = match &request.event_id {
        Some(event_id) => Some(
            state
                .records()
                .event(event_id)
                .await?
                .ok_or(AppError::NotFound(NotFoundKind::Event))?,
        ),
        None => None,
    };
    if state.config.is_admin(actor) {
        return Ok(());
    }
    match event {
        Some(event) if event.created_by == *actor && request.user_id != *actor => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}
