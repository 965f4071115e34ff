// Attendance entity
// One join record per (user, event); its timestamps encode the attendance state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::{EventId, JoinId, UserId};

/// Persisted row layout of the `joins` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRecord {
    pub id: JoinId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl JoinRecord {
    pub fn new(user_id: UserId, event_id: EventId, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: JoinId::generate(),
            event_id,
            user_id,
            joined_at,
            checked_in_at: None,
            checked_out_at: None,
        }
    }

    /// Lifts the nullable columns into an [`AttendanceState`].
    pub fn state(&self) -> Result<AttendanceState, InvalidJoinRecord> {
        match (self.checked_in_at, self.checked_out_at) {
            (None, None) => Ok(AttendanceState::Joined {
                joined_at: self.joined_at,
            }),
            (Some(checked_in_at), None) if checked_in_at >= self.joined_at => {
                Ok(AttendanceState::CheckedIn {
                    joined_at: self.joined_at,
                    checked_in_at,
                })
            }
            (Some(checked_in_at), Some(checked_out_at))
                if checked_in_at >= self.joined_at && checked_out_at >= checked_in_at =>
            {
                Ok(AttendanceState::CheckedOut {
                    joined_at: self.joined_at,
                    checked_in_at,
                    checked_out_at,
                })
            }
            (None, Some(_)) => Err(InvalidJoinRecord::CheckedOutWithoutCheckIn(self.id.clone())),
            _ => Err(InvalidJoinRecord::TimestampsOutOfOrder(self.id.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidJoinRecord {
    #[error("join {0} has a check-out without a check-in")]
    CheckedOutWithoutCheckIn(JoinId),
    #[error("join {0} has timestamps out of order")]
    TimestampsOutOfOrder(JoinId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttendanceState {
    NotJoined,
    Joined {
        joined_at: DateTime<Utc>,
    },
    CheckedIn {
        joined_at: DateTime<Utc>,
        checked_in_at: DateTime<Utc>,
    },
    CheckedOut {
        joined_at: DateTime<Utc>,
        checked_in_at: DateTime<Utc>,
        checked_out_at: DateTime<Utc>,
    },
}

/// Attempted transition from the wrong state. Expected and recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceConflict {
    #[error("already joined this event")]
    AlreadyJoined,
    #[error("not joined to this event")]
    NotJoined,
    #[error("already checked in")]
    AlreadyCheckedIn,
    #[error("not checked in")]
    NotCheckedIn,
    #[error("already checked out")]
    AlreadyCheckedOut,
}

impl AttendanceConflict {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceConflict::AlreadyJoined => "already_joined",
            AttendanceConflict::NotJoined => "not_joined",
            AttendanceConflict::AlreadyCheckedIn => "already_checked_in",
            AttendanceConflict::NotCheckedIn => "not_checked_in",
            AttendanceConflict::AlreadyCheckedOut => "already_checked_out",
        }
    }
}

// Transition timestamps are clamped so that
// joined_at <= checked_in_at <= checked_out_at holds under clock skew.
impl AttendanceState {
    pub fn of(record: Option<&JoinRecord>) -> Result<Self, InvalidJoinRecord> {
        match record {
            Some(record) => record.state(),
            None => Ok(AttendanceState::NotJoined),
        }
    }

    pub fn join(self, now: DateTime<Utc>) -> Result<Self, AttendanceConflict> {
        match self {
            AttendanceState::NotJoined => Ok(AttendanceState::Joined { joined_at: now }),
            _ => Err(AttendanceConflict::AlreadyJoined),
        }
    }

    pub fn check_in(self, now: DateTime<Utc>) -> Result<Self, AttendanceConflict> {
        match self {
            AttendanceState::NotJoined => Err(AttendanceConflict::NotJoined),
            AttendanceState::Joined { joined_at } => Ok(AttendanceState::CheckedIn {
                joined_at,
                checked_in_at: now.max(joined_at),
            }),
            AttendanceState::CheckedIn { .. } | AttendanceState::CheckedOut { .. } => {
                Err(AttendanceConflict::AlreadyCheckedIn)
            }
        }
    }

    pub fn check_out(self, now: DateTime<Utc>) -> Result<Self, AttendanceConflict> {
        match self {
            AttendanceState::NotJoined | AttendanceState::Joined { .. } => {
                Err(AttendanceConflict::NotCheckedIn)
            }
            AttendanceState::CheckedIn {
                joined_at,
                checked_in_at,
            } => Ok(AttendanceState::CheckedOut {
                joined_at,
                checked_in_at,
                checked_out_at: now.max(checked_in_at),
            }),
            AttendanceState::CheckedOut { .. } => Err(AttendanceConflict::AlreadyCheckedOut),
        }
    }

    pub fn leave(self) -> Result<Self, AttendanceConflict> {
        match self {
            AttendanceState::NotJoined => Err(AttendanceConflict::NotJoined),
            AttendanceState::Joined { .. } | AttendanceState::CheckedIn { .. } => {
                Ok(AttendanceState::NotJoined)
            }
            AttendanceState::CheckedOut { .. } => Err(AttendanceConflict::AlreadyCheckedOut),
        }
    }

    pub fn checked_in_at(&self) -> Option<DateTime<Utc>> {
        match self {
            AttendanceState::CheckedIn { checked_in_at, .. }
            | AttendanceState::CheckedOut { checked_in_at, .. } => Some(*checked_in_at),
            _ => None,
        }
    }

    pub fn checked_out_at(&self) -> Option<DateTime<Utc>> {
        match self {
            AttendanceState::CheckedOut { checked_out_at, .. } => Some(*checked_out_at),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceState::NotJoined => "not_joined",
            AttendanceState::Joined { .. } => "joined",
            AttendanceState::CheckedIn { .. } => "checked_in",
            AttendanceState::CheckedOut { .. } => "checked_out",
        }
    }
}
