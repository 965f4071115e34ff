use chrono::{DateTime, Utc};

use crate::value_objects::UserId;

/// Resolves the authenticated caller. Injected per request, never global.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
