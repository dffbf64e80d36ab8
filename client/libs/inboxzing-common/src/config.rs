//! Client configuration
//!
//! Loaded from `INBOXZING_*` environment variables (a `.env` file is honoured).
//! Every field has a development default, so an empty environment is valid.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "INBOXZING_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the newsletter backend (preferences, points, mark-as-read)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// News-sources listing used to build the option catalog
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// API key appended to catalog requests, if the listing needs one
    #[serde(default)]
    pub catalog_api_key: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retry attempts for background sync after the first try
    #[serde(default = "default_sync_max_retries")]
    pub sync_max_retries: u32,

    #[serde(default = "default_sync_initial_backoff_ms")]
    pub sync_initial_backoff_ms: u64,

    #[serde(default = "default_sync_max_backoff_ms")]
    pub sync_max_backoff_ms: u64,

    /// Offset of the calendar used for weekend double points, in minutes east of UTC
    #[serde(default)]
    pub reference_utc_offset_minutes: i32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            catalog_url: default_catalog_url(),
            catalog_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            sync_max_retries: default_sync_max_retries(),
            sync_initial_backoff_ms: default_sync_initial_backoff_ms(),
            sync_max_backoff_ms: default_sync_max_backoff_ms(),
            reference_utc_offset_minutes: 0,
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();

        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.catalog_url.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.sync_initial_backoff_ms > self.sync_max_backoff_ms {
            return Err(ConfigError::Invalid(format!(
                "sync_initial_backoff_ms ({}) exceeds sync_max_backoff_ms ({})",
                self.sync_initial_backoff_ms, self.sync_max_backoff_ms
            )));
        }
        self.reference_offset()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Calendar offset used to decide whether "now" falls on a weekend
    pub fn reference_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.reference_utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "reference_utc_offset_minutes out of range: {}",
                self.reference_utc_offset_minutes
            ))
        })
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_catalog_url() -> String {
    "https://newsapi.org/v2/top-headlines/sources".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_sync_max_retries() -> u32 {
    3
}

fn default_sync_initial_backoff_ms() -> u64 {
    200
}

fn default_sync_max_backoff_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "INBOXZING_API_BASE_URL",
            "INBOXZING_REQUEST_TIMEOUT_SECS",
            "INBOXZING_REFERENCE_UTC_OFFSET_MINUTES",
            "INBOXZING_LOG_JSON",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.sync_max_retries, 3);
        assert_eq!(config.reference_offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("INBOXZING_API_BASE_URL", "https://api.inboxzing.dev");
        std::env::set_var("INBOXZING_REFERENCE_UTC_OFFSET_MINUTES", "-300");
        std::env::set_var("INBOXZING_LOG_JSON", "true");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_base_url, "https://api.inboxzing.dev");
        assert_eq!(config.reference_offset().unwrap().local_minus_utc(), -300 * 60);
        assert!(config.log_json);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_timeout() {
        clear_env();
        std::env::set_var("INBOXZING_REQUEST_TIMEOUT_SECS", "0");
        let result = ClientConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        clear_env();
    }

    #[test]
    fn test_offset_out_of_range() {
        let config = ClientConfig {
            reference_utc_offset_minutes: 24 * 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
