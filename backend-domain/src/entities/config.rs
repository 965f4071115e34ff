// Runtime configuration handed from infrastructure to the application layer

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub qr_secret: Option<String>,
    pub store_timeout_ms: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub calendar: CalendarConfig,
    pub award_policy: AwardPolicyConfig,
    /// Users allowed to append manual awards and corrections for anyone.
    pub admin_users: Vec<UserId>,
}

impl RuntimeConfig {
    pub fn is_admin(&self, user: &UserId) -> bool {
        self.admin_users.iter().any(|admin| admin == user)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            qr_secret: None,
            store_timeout_ms: 5_000,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            calendar: CalendarConfig::default(),
            award_policy: AwardPolicyConfig::default(),
            admin_users: Vec::new(),
        }
    }
}

/// Week bucket boundary; must be identical for every calculation of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarConfig {
    pub week_start: Weekday,
    pub utc_offset_minutes: i32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_start: Weekday::Mon,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AwardPolicyConfig {
    Flat {
        check_in_points: u32,
        check_out_points: u32,
    },
    Duration {
        check_in_points: u32,
        points_per_hour: u32,
        minimum_points: u32,
    },
}

impl Default for AwardPolicyConfig {
    fn default() -> Self {
        AwardPolicyConfig::Flat {
            check_in_points: 10,
            check_out_points: 5,
        }
    }
}
