pub mod attendance_commands;
pub mod event_commands;
pub mod group_commands;
pub mod ledger_commands;

use backend_domain::{IdentityProvider, UserId};

use crate::AppError;

pub(crate) fn caller(identity: &dyn IdentityProvider) -> Result<UserId, AppError> {
    identity.current_user_id().ok_or(AppError::Unauthenticated)
}

pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
