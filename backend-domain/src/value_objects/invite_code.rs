// Group invite code value object

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const INVITE_CODE_LEN: usize = 8;

// Excludes 0, O, 1 and I.
const ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteCode(String);

impl InviteCode {
    pub fn generate() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        let code = bytes
            .iter()
            .take(INVITE_CODE_LEN)
            .map(|byte| ALPHABET[(*byte as usize) % ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    /// Normalizes user input; `None` when it cannot be an invite code.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.len() != INVITE_CODE_LEN {
            return None;
        }
        if !normalized.bytes().all(|byte| byte.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_parse_back() {
        let code = InviteCode::generate();
        assert_eq!(code.as_str().len(), INVITE_CODE_LEN);
        assert_eq!(InviteCode::parse(code.as_str()), Some(code));
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        let code = InviteCode::parse("  abcd2345 ").expect("valid code");
        assert_eq!(code.as_str(), "ABCD2345");
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        assert!(InviteCode::parse("ABC").is_none());
        assert!(InviteCode::parse("ABCD-234").is_none());
        assert!(InviteCode::parse("").is_none());
    }
}
