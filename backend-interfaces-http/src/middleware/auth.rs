use axum::http::HeaderMap;

use backend_domain::{IdentityProvider, RuntimeConfig, UserId};

use crate::error::HttpError;

/// Header carrying the authenticated user id, set by the fronting auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Caller resolved from one request's headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    user_id: Option<UserId>,
}

impl RequestIdentity {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(UserId::from);
        Self { user_id }
    }
}

impl IdentityProvider for RequestIdentity {
    fn current_user_id(&self) -> Option<UserId> {
        self.user_id.clone()
    }
}

/// Checks the API token and resolves the caller in one step.
pub fn guard(config: &RuntimeConfig, headers: &HeaderMap) -> Result<RequestIdentity, HttpError> {
    if !authorize(config, headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(RequestIdentity::from_headers(headers))
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn bearer_token_is_required_when_configured() {
        let config = RuntimeConfig {
            api_token: Some("s3cret".to_string()),
            ..RuntimeConfig::default()
        };
        assert!(!authorize(&config, &headers(&[])));
        assert!(!authorize(&config, &headers(&[("authorization", "Bearer nope")])));
        assert!(!authorize(&config, &headers(&[("authorization", "s3cret")])));
        assert!(authorize(&config, &headers(&[("authorization", "Bearer s3cret")])));
        assert!(authorize(&RuntimeConfig::default(), &headers(&[])));
    }

    #[test]
    fn identity_comes_from_user_header() {
        let identity = RequestIdentity::from_headers(&headers(&[(USER_ID_HEADER, " u-1 ")]));
        assert_eq!(identity.current_user_id(), Some(UserId::from("u-1")));
        let blank = RequestIdentity::from_headers(&headers(&[(USER_ID_HEADER, "  ")]));
        assert_eq!(blank.current_user_id(), None);
    }
}
