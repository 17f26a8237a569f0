use std::time::Duration;

use serde::Deserialize;

use crate::error::TokenError;

pub const SAFETY_MARGIN_SECONDS_DEFAULT: u64 = 5;
pub const FETCH_TIMEOUT_SECONDS_DEFAULT: u64 = 10;
pub const INITIAL_BACKOFF_SECONDS_DEFAULT: u64 = 1;
pub const MAX_BACKOFF_SECONDS_DEFAULT: u64 = 60;

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    pub safety_margin_seconds: Option<u64>,
    pub fetch_timeout_seconds: Option<u64>,
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub server: Option<ServerConfig>,
    pub logging: Option<LoggingConfig>,
}

impl SettingsConfig {
    /// Resolve the lifecycle constants, falling back to the defaults.
    pub fn lifecycle(&self) -> LifecycleSettings {
        let retry = self.retry.as_ref();
        LifecycleSettings {
            safety_margin: Duration::from_secs(
                self.safety_margin_seconds.unwrap_or(SAFETY_MARGIN_SECONDS_DEFAULT),
            ),
            fetch_timeout: Duration::from_secs(
                self.fetch_timeout_seconds.unwrap_or(FETCH_TIMEOUT_SECONDS_DEFAULT),
            ),
            initial_backoff: Duration::from_secs(
                retry
                    .and_then(|r| r.initial_backoff_seconds)
                    .unwrap_or(INITIAL_BACKOFF_SECONDS_DEFAULT),
            ),
            max_backoff: Duration::from_secs(
                retry
                    .and_then(|r| r.max_backoff_seconds)
                    .unwrap_or(MAX_BACKOFF_SECONDS_DEFAULT),
            ),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// doubled after every failed refresh until max_backoff_seconds
    pub initial_backoff_seconds: Option<u64>,
    /// invariant: >= initial_backoff_seconds
    pub max_backoff_seconds: Option<u64>,
}

/// Timing constants used by the token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// refresh this long before the token expires
    pub safety_margin: Duration,
    /// deadline for every single fetch
    pub fetch_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl LifecycleSettings {
    /// Names of timings that cannot drive a refresh loop: a zero deadline or
    /// initial backoff, or a cap below the initial backoff.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if self.fetch_timeout.is_zero() {
            invalid.push("fetch_timeout");
        }
        if self.initial_backoff.is_zero() {
            invalid.push("initial_backoff");
        }
        if self.max_backoff < self.initial_backoff {
            invalid.push("max_backoff");
        }
        invalid
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        let invalid = self.invalid_fields();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(TokenError::InvalidSettings(invalid))
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        SettingsConfig::default().lifecycle()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
