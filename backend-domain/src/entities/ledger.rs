// Points ledger entity
// Append-only; the sum of a user's entries is their authoritative total

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::{EntryId, EventId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsReason {
    EventCheckin,
    EventCheckout,
    ManualAward,
    Correction,
}

impl PointsReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsReason::EventCheckin => "event_checkin",
            PointsReason::EventCheckout => "event_checkout",
            PointsReason::ManualAward => "manual_award",
            PointsReason::Correction => "correction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub amount: i64,
    pub reason: PointsReason,
    #[serde(default)]
    pub event_id: Option<EventId>,
    /// Unique per awarded transition, `None` for administrative entries.
    #[serde(default)]
    pub dedupe_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must be non-zero")]
    InvalidAmount,
    #[error("{0} entries must not be negative")]
    NegativeAward(&'static str),
}

impl LedgerEntry {
    pub fn new(
        user_id: UserId,
        amount: i64,
        reason: PointsReason,
        event_id: Option<EventId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        validate_amount(amount, reason)?;
        Ok(Self {
            id: EntryId::generate(),
            user_id,
            amount,
            reason,
            event_id,
            dedupe_key: None,
            created_at,
        })
    }

    /// Entry emitted by an attendance transition; at most one per (user, event, reason).
    pub fn for_transition(
        user_id: UserId,
        event_id: EventId,
        reason: PointsReason,
        amount: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let dedupe_key = transition_dedupe_key(&user_id, &event_id, reason);
        let mut entry = Self::new(user_id, i64::from(amount), reason, Some(event_id), created_at)?;
        entry.dedupe_key = Some(dedupe_key);
        Ok(entry)
    }
}

pub fn transition_dedupe_key(user_id: &UserId, event_id: &EventId, reason: PointsReason) -> String {
    format!("{}:{}:{}", user_id, event_id, reason.as_str())
}

pub fn validate_amount(amount: i64, reason: PointsReason) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount);
    }
    if amount < 0 && reason != PointsReason::Correction {
        return Err(LedgerError::NegativeAward(reason.as_str()));
    }
    Ok(())
}

/// Signed sum of `entries`, restricted to `created_at >= since` when given.
pub fn sum_entries<'a>(
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
    since: Option<DateTime<Utc>>,
) -> i64 {
    entries
        .into_iter()
        .filter(|entry| since.map_or(true, |since| entry.created_at >= since))
        .map(|entry| entry.amount)
        .sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardRequest {
    pub user_id: UserId,
    pub amount: i64,
    pub reason: PointsReason,
    #[serde(default)]
    pub event_id: Option<EventId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(amount: i64, reason: PointsReason, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry::new(UserId::from("u1"), amount, reason, None, created_at).expect("entry")
    }

    #[test]
    fn zero_amounts_are_rejected_for_every_reason() {
        let now = Utc::now();
        for reason in [
            PointsReason::EventCheckin,
            PointsReason::EventCheckout,
            PointsReason::ManualAward,
            PointsReason::Correction,
        ] {
            let err = LedgerEntry::new(UserId::from("u1"), 0, reason, None, now)
                .expect_err("zero amount");
            assert_eq!(err, LedgerError::InvalidAmount);
        }
    }

    #[test]
    fn only_corrections_may_be_negative() {
        let now = Utc::now();
        let correction =
            LedgerEntry::new(UserId::from("u1"), -5, PointsReason::Correction, None, now);
        assert!(correction.is_ok());
        let err = LedgerEntry::new(UserId::from("u1"), -5, PointsReason::ManualAward, None, now)
            .expect_err("negative award");
        assert_eq!(err, LedgerError::NegativeAward("manual_award"));
    }

    #[test]
    fn sum_is_order_independent_and_respects_since() {
        let base = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let mut entries = vec![
            entry(10, PointsReason::EventCheckin, base),
            entry(5, PointsReason::EventCheckout, base + Duration::hours(2)),
            entry(-3, PointsReason::Correction, base + Duration::days(1)),
            entry(20, PointsReason::ManualAward, base + Duration::days(2)),
        ];
        assert_eq!(sum_entries(&entries, None), 32);
        entries.reverse();
        assert_eq!(sum_entries(&entries, None), 32);
        assert_eq!(sum_entries(&entries, Some(base + Duration::days(1))), 17);
    }

    #[test]
    fn transition_entries_carry_a_dedupe_key() {
        let entry = LedgerEntry::for_transition(
            UserId::from("u1"),
            EventId::from("e1"),
            PointsReason::EventCheckin,
            10,
            Utc::now(),
        )
        .expect("entry");
        assert_eq!(entry.dedupe_key.as_deref(), Some("u1:e1:event_checkin"));
        assert_eq!(entry.amount, 10);
    }
}
