use anyhow::anyhow;
use thiserror::Error;

use backend_domain::{AttendanceConflict, InvalidJoinRecord, LedgerError, StoreError};

/// Operation attempted from the wrong state; the caller already did this or
/// cannot do it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictKind {
    #[error(transparent)]
    Attendance(#[from] AttendanceConflict),
    #[error("event is at capacity")]
    EventFull,
    #[error("already a member of this group")]
    AlreadyMember,
    #[error("the last admin cannot leave while other members remain")]
    LastAdmin,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Attendance(conflict) => conflict.as_str(),
            ConflictKind::EventFull => "event_full",
            ConflictKind::AlreadyMember => "already_member",
            ConflictKind::LastAdmin => "last_admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotFoundKind {
    #[error("event not found")]
    Event,
    #[error("group not found")]
    Group,
    #[error("invalid invite code")]
    InvalidInviteCode,
    #[error("user is not a member of this group")]
    NotAMember,
}

impl NotFoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundKind::Event => "event_not_found",
            NotFoundKind::Group => "group_not_found",
            NotFoundKind::InvalidInviteCode => "invalid_invite_code",
            NotFoundKind::NotAMember => "not_a_member",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(ConflictKind),
    #[error("{0}")]
    NotFound(NotFoundKind),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::Conflict(kind) => kind.as_str(),
            AppError::NotFound(kind) => kind.as_str(),
            AppError::BackendUnavailable(_) => "backend_unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    /// Outcomes the caller is expected to hit in normal use.
    pub fn is_expected(&self) -> bool {
        !matches!(
            self,
            AppError::BackendUnavailable(_) | AppError::Internal(_)
        )
    }
}

impl From<ConflictKind> for AppError {
    fn from(value: ConflictKind) -> Self {
        AppError::Conflict(value)
    }
}

impl From<AttendanceConflict> for AppError {
    fn from(value: AttendanceConflict) -> Self {
        AppError::Conflict(ConflictKind::Attendance(value))
    }
}

impl From<NotFoundKind> for AppError {
    fn from(value: NotFoundKind) -> Self {
        AppError::NotFound(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        AppError::Validation(value.to_string())
    }
}

impl From<InvalidJoinRecord> for AppError {
    fn from(value: InvalidJoinRecord) -> Self {
        AppError::Internal(anyhow!(value))
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Timeout(_) | StoreError::Unavailable(_) => {
                AppError::BackendUnavailable(value.to_string())
            }
            StoreError::UniqueViolation { .. } | StoreError::Malformed { .. } => {
                AppError::Internal(anyhow!(value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::Collection;
    use std::time::Duration;

    #[test]
    fn store_failures_split_into_unavailable_and_internal() {
        let err = AppError::from(StoreError::Timeout(Duration::from_millis(50)));
        assert_eq!(err.kind(), "backend_unavailable");
        assert!(!err.is_expected());

        let err = AppError::from(StoreError::Malformed {
            collection: Collection::Joins,
            message: "missing field".to_string(),
        });
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn conflicts_are_expected_and_specific() {
        let err = AppError::from(AttendanceConflict::AlreadyCheckedIn);
        assert!(err.is_expected());
        assert_eq!(err.kind(), "already_checked_in");
        assert_eq!(err.to_string(), "already checked in");
    }
}
