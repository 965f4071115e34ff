use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{AwardPolicyConfig, CalendarConfig, RuntimeConfig, UserId};

use super::validation::{parse_week_start, validate_award_policy, validate_utc_offset};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub qr_secret: Option<String>,
    pub store_backend: StoreBackend,
    pub store_path: String,
    pub store_timeout_ms: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub week_start: String,
    pub utc_offset_minutes: i32,
    pub award_policy: AwardPolicyConfig,
    pub admin_users: Vec<String>,
    pub log_format: LogFormat,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            qr_secret: None,
            store_backend: StoreBackend::File,
            store_path: "./data/ledger.json".to_string(),
            store_timeout_ms: 5_000,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            week_start: "monday".to_string(),
            utc_offset_minutes: 0,
            award_policy: AwardPolicyConfig::default(),
            admin_users: Vec::new(),
            log_format: LogFormat::Text,
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("VOLUNTEER_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.qr_secret = non_blank(self.qr_secret.take());
        self.log_dir = non_blank(self.log_dir.take());
        self.week_start = self.week_start.trim().to_lowercase();
        self.admin_users = self
            .admin_users
            .iter()
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty())
            .collect();
        self.admin_users.sort();
        self.admin_users.dedup();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.store_path = resolve_path(base, &self.store_path);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.store_backend == StoreBackend::File && self.store_path.trim().is_empty() {
            return Err(anyhow!("store_path must not be empty for the file store"));
        }
        if self.store_timeout_ms == 0 {
            return Err(anyhow!("store_timeout_ms must be greater than 0"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        parse_week_start(&self.week_start)?;
        validate_utc_offset(self.utc_offset_minutes)?;
        validate_award_policy(&self.award_policy)?;
        Ok(())
    }

    pub fn to_runtime_config(&self) -> Result<RuntimeConfig> {
        Ok(RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            qr_secret: self.qr_secret.clone(),
            store_timeout_ms: self.store_timeout_ms,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            calendar: CalendarConfig {
                week_start: parse_week_start(&self.week_start)?,
                utc_offset_minutes: self.utc_offset_minutes,
            },
            award_policy: self.award_policy.clone(),
            admin_users: self
                .admin_users
                .iter()
                .map(|user| UserId::from(user.as_str()))
                .collect(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("VOLUNTEER_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("VOLUNTEER_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("VOLUNTEER_QR_SECRET") {
            self.qr_secret = Some(value);
        }
        if let Ok(value) = env::var("VOLUNTEER_STORE_BACKEND") {
            match value.trim().to_lowercase().as_str() {
                "memory" => self.store_backend = StoreBackend::Memory,
                "file" => self.store_backend = StoreBackend::File,
                other => warn!("ignoring unknown VOLUNTEER_STORE_BACKEND '{}'", other),
            }
        }
        if let Ok(value) = env::var("VOLUNTEER_STORE_PATH") {
            self.store_path = value;
        }
        if let Ok(value) = env::var("VOLUNTEER_STORE_TIMEOUT_MS") {
            self.store_timeout_ms = value.parse().unwrap_or(self.store_timeout_ms);
        }
        if let Ok(value) = env::var("VOLUNTEER_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("VOLUNTEER_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("VOLUNTEER_WEEK_START") {
            self.week_start = value;
        }
        if let Ok(value) = env::var("VOLUNTEER_UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = value.parse().unwrap_or(self.utc_offset_minutes);
        }
        if let Ok(value) = env::var("VOLUNTEER_ADMIN_USERS") {
            self.admin_users = value.split(',').map(str::to_string).collect();
        }
        if let Ok(value) = env::var("VOLUNTEER_LOG_FORMAT") {
            match value.trim().to_lowercase().as_str() {
                "json" => self.log_format = LogFormat::Json,
                "text" => self.log_format = LogFormat::Text,
                other => warn!("ignoring unknown VOLUNTEER_LOG_FORMAT '{}'", other),
            }
        }
        if let Ok(value) = env::var("VOLUNTEER_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
