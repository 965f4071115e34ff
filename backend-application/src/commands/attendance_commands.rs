use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use backend_domain::{
    to_row, AttendanceConflict, AttendanceState, Collection, Event, EventId, Filter,
    IdentityProvider, JoinRecord, LedgerEntry, PointsReason, Row, UserId,
};

use crate::commands::caller;
use crate::qr::{decode_event_qr, encode_event_qr};
use crate::queries::attendance_queries::require_event;
use crate::records::join_filter;
use crate::{AppError, AppState, ConflictKind};

type Transition = fn(AttendanceState, DateTime<Utc>) -> Result<AttendanceState, AttendanceConflict>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceOutcome {
    pub event_id: EventId,
    pub user_id: UserId,
    pub attendance: AttendanceState,
    /// Ledger entry written by this transition, if any.
    pub awarded: Option<LedgerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventQr {
    pub event_id: EventId,
    pub payload: String,
}

pub async fn join_event(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    state.observe("join_event", try_join(state, identity, event_id).await)
}

pub async fn check_in(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    state.observe("check_in", try_check_in(state, identity, event_id).await)
}

pub async fn check_out(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    state.observe("check_out", try_check_out(state, identity, event_id).await)
}

pub async fn leave_event(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    state.observe("leave_event", try_leave(state, identity, event_id).await)
}

pub async fn check_in_by_qr(
    state: &AppState,
    identity: &dyn IdentityProvider,
    payload: &str,
) -> Result<AttendanceOutcome, AppError> {
    let result: Result<AttendanceOutcome, AppError> = async {
        let event_id = decode_event_qr(qr_secret(state)?, payload)?;
        try_check_in(state, identity, &event_id).await
    }
    .await;
    state.observe("check_in_by_qr", result)
}

pub async fn check_out_by_qr(
    state: &AppState,
    identity: &dyn IdentityProvider,
    payload: &str,
) -> Result<AttendanceOutcome, AppError> {
    let result: Result<AttendanceOutcome, AppError> = async {
        let event_id = decode_event_qr(qr_secret(state)?, payload)?;
        try_check_out(state, identity, &event_id).await
    }
    .await;
    state.observe("check_out_by_qr", result)
}

/// Only the event's creator may issue its QR payload.
pub async fn issue_event_qr(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<EventQr, AppError> {
    let result: Result<EventQr, AppError> = async {
        let user_id = caller(identity)?;
        let secret = qr_secret(state)?;
        let event = require_event(state, event_id).await?;
        if event.created_by != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(EventQr {
            payload: encode_event_qr(secret, &event.id)?,
            event_id: event.id,
        })
    }
    .await;
    state.observe("issue_event_qr", result)
}

async fn try_join(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    let user_id = caller(identity)?;
    let event = require_event(state, event_id).await?;
    let records = state.records();
    let now = state.now();

    let current = AttendanceState::of(records.join(&user_id, event_id).await?.as_ref())?;
    let next = current.join(now)?;

    // Soft limit; concurrent joins may overshoot by the number of racers.
    if let Some(capacity) = event.capacity {
        let joined = records.joins_for_event(event_id).await?.len();
        if joined >= capacity as usize {
            return Err(ConflictKind::EventFull.into());
        }
    }

    let record = JoinRecord::new(user_id.clone(), event.id.clone(), now);
    match state
        .store
        .insert(Collection::Joins, to_row(Collection::Joins, &record)?)
        .await
    {
        Ok(_) => {}
        Err(err) if err.is_unique_violation() => {
            return Err(AttendanceConflict::AlreadyJoined.into());
        }
        Err(err) => return Err(err.into()),
    }

    state.metrics.record_join();
    info!(user_id = %user_id, event_id = %event_id, "joined event");
    Ok(AttendanceOutcome {
        event_id: event.id,
        user_id,
        attendance: next,
        awarded: None,
    })
}

async fn try_check_in(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    let user_id = caller(identity)?;
    let event = require_event(state, event_id).await?;
    let now = state.now();

    let record = state.records().join(&user_id, event_id).await?;
    let next = AttendanceState::of(record.as_ref())?.check_in(now)?;
    let checked_in_at = next
        .checked_in_at()
        .ok_or_else(|| anyhow!("check-in produced no timestamp"))?;

    let guard = join_filter(&user_id, event_id).is_null("checked_in_at");
    stamp(
        state,
        &user_id,
        event_id,
        guard,
        "checked_in_at",
        checked_in_at,
        now,
        AttendanceState::check_in,
    )
    .await?;

    let points = state.award_policy.check_in_points(&event);
    let awarded = award_transition(
        state,
        &user_id,
        &event,
        PointsReason::EventCheckin,
        points,
        checked_in_at,
    )
    .await;
    let awarded = match awarded {
        Ok(awarded) => awarded,
        Err(err) => {
            let err = revert_stamp(
                state,
                &user_id,
                event_id,
                "checked_in_at",
                checked_in_at,
                err,
            )
            .await;
            return Err(err);
        }
    };

    state.metrics.record_check_in();
    info!(user_id = %user_id, event_id = %event_id, "checked in");
    Ok(AttendanceOutcome {
        event_id: event.id,
        user_id,
        attendance: next,
        awarded,
    })
}

async fn try_check_out(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    let user_id = caller(identity)?;
    let event = require_event(state, event_id).await?;
    let now = state.now();

    let record = state.records().join(&user_id, event_id).await?;
    let next = AttendanceState::of(record.as_ref())?.check_out(now)?;
    let (checked_in_at, checked_out_at) = next
        .checked_in_at()
        .zip(next.checked_out_at())
        .ok_or_else(|| anyhow!("check-out produced no timestamps"))?;

    let guard = join_filter(&user_id, event_id)
        .not_null("checked_in_at")
        .is_null("checked_out_at");
    stamp(
        state,
        &user_id,
        event_id,
        guard,
        "checked_out_at",
        checked_out_at,
        now,
        AttendanceState::check_out,
    )
    .await?;

    let points = state
        .award_policy
        .check_out_points(&event, checked_in_at, checked_out_at);
    let awarded = award_transition(
        state,
        &user_id,
        &event,
        PointsReason::EventCheckout,
        points,
        checked_out_at,
    )
    .await;
    let awarded = match awarded {
        Ok(awarded) => awarded,
        Err(err) => {
            let err = revert_stamp(
                state,
                &user_id,
                event_id,
                "checked_out_at",
                checked_out_at,
                err,
            )
            .await;
            return Err(err);
        }
    };

    state.metrics.record_check_out();
    info!(user_id = %user_id, event_id = %event_id, "checked out");
    Ok(AttendanceOutcome {
        event_id: event.id,
        user_id,
        attendance: next,
        awarded,
    })
}

async fn try_leave(
    state: &AppState,
    identity: &dyn IdentityProvider,
    event_id: &EventId,
) -> Result<AttendanceOutcome, AppError> {
    let user_id = caller(identity)?;
    let now = state.now();

    let record = state.records().join(&user_id, event_id).await?;
    let next = AttendanceState::of(record.as_ref())?.leave()?;

    let guard = join_filter(&user_id, event_id).is_null("checked_out_at");
    let removed = state.store.delete(Collection::Joins, &guard).await?;
    if removed == 0 {
        let conflict =
            conflict_after_race(state, &user_id, event_id, now, |current, _| current.leave()).await;
        return Err(conflict);
    }

    state.metrics.record_leave();
    info!(user_id = %user_id, event_id = %event_id, "left event");
    Ok(AttendanceOutcome {
        event_id: event_id.clone(),
        user_id,
        attendance: next,
        awarded: None,
    })
}

/// Compare-and-set of one timestamp column. A lost race is reported as the
/// conflict the winning write produced.
#[allow(clippy::too_many_arguments)]
async fn stamp(
    state: &AppState,
    user_id: &UserId,
    event_id: &EventId,
    guard: Filter,
    field: &str,
    at: DateTime<Utc>,
    now: DateTime<Utc>,
    transition: Transition,
) -> Result<(), AppError> {
    let mut patch = Row::new();
    patch.insert(field.to_string(), json!(at));
    match state.store.update(Collection::Joins, &guard, patch).await? {
        Some(_) => Ok(()),
        None => Err(conflict_after_race(state, user_id, event_id, now, transition).await),
    }
}

async fn conflict_after_race(
    state: &AppState,
    user_id: &UserId,
    event_id: &EventId,
    now: DateTime<Utc>,
    transition: Transition,
) -> AppError {
    let record = match state.records().join(user_id, event_id).await {
        Ok(record) => record,
        Err(err) => return err.into(),
    };
    match AttendanceState::of(record.as_ref()) {
        Ok(current) => match transition(current, now) {
            Err(conflict) => conflict.into(),
            Ok(_) => AppError::Internal(anyhow!(
                "join of {} to {} changed concurrently",
                user_id,
                event_id
            )),
        },
        Err(err) => err.into(),
    }
}

/// Writes the transition's ledger entry. A dedupe-key collision means the
/// transition was already awarded and yields `None`.
async fn award_transition(
    state: &AppState,
    user_id: &UserId,
    event: &Event,
    reason: PointsReason,
    points: u32,
    at: DateTime<Utc>,
) -> Result<Option<LedgerEntry>, AppError> {
    if points == 0 {
        debug!(
            user_id = %user_id,
            event_id = %event.id,
            reason = reason.as_str(),
            "policy awarded nothing"
        );
        return Ok(None);
    }
    let entry =
        LedgerEntry::for_transition(user_id.clone(), event.id.clone(), reason, points, at)?;
    let row = to_row(Collection::PointsLedger, &entry)?;
    match state.store.insert(Collection::PointsLedger, row).await {
        Ok(_) => {
            state.metrics.record_ledger_entry();
            info!(
                user_id = %user_id,
                event_id = %event.id,
                amount = entry.amount,
                reason = reason.as_str(),
                "points awarded"
            );
            Ok(Some(entry))
        }
        Err(err) if err.is_unique_violation() => {
            debug!(
                user_id = %user_id,
                event_id = %event.id,
                reason = reason.as_str(),
                "transition already awarded"
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Clears a stamp whose award could not be written and hands back `cause`.
///
/// If clearing fails too, the join stays stamped without a ledger entry and
/// every retry of the transition reports it as already done, so those points
/// are lost until someone appends a correction. That case is returned as
/// `Internal` carrying both failures instead of the award's own error.
async fn revert_stamp(
    state: &AppState,
    user_id: &UserId,
    event_id: &EventId,
    field: &str,
    at: DateTime<Utc>,
    cause: AppError,
) -> AppError {
    let guard = join_filter(user_id, event_id).eq(field, json!(at));
    let mut patch = Row::new();
    patch.insert(field.to_string(), Value::Null);
    match state.store.update(Collection::Joins, &guard, patch).await {
        Ok(_) => cause,
        Err(revert) => {
            error!(
                user_id = %user_id,
                event_id = %event_id,
                field,
                "{} left stamped without points: {}; revert failed: {}",
                field,
                cause,
                revert
            );
            AppError::Internal(anyhow!(
                "{} of {} at {} left stamped without points: {}; revert failed: {}",
                field,
                user_id,
                event_id,
                cause,
                revert
            ))
        }
    }
}

fn qr_secret(state: &AppState) -> Result<&str, AppError> {
    state
        .config
        .qr_secret
        .as_deref()
        .ok_or_else(|| AppError::Validation("qr check-in disabled".to_string()))
}
