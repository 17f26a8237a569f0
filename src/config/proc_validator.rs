//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks settings invariants (retry bounds, timeouts, logging, metrics path)
//!   and the identity provider connection block.

use tracing::{error, info};

use crate::config::connection::ConnectionConfig;
use crate::config::settings::SettingsConfig;
use crate::config::types::ServiceConfig;
use crate::observability::metrics::get_metrics;

const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_connection(&cfg.connection, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    validate_retry("settings.retry", settings, errors);

    if let Some(s) = settings.safety_margin_seconds {
        if s > 60 * 60 * 24 {
            errors.push(format!(
                "settings.safety_margin_seconds ({}) is unreasonably large",
                s
            ));
        }
    }

    if settings.fetch_timeout_seconds == Some(0) {
        errors.push("settings.fetch_timeout_seconds must be > 0".to_string());
    }

    if let Some(server) = &settings.server {
        if server.host.is_empty() {
            errors.push("settings.server.host must not be empty".to_string());
        }
        if server.port.parse::<u16>().is_err() {
            errors.push(format!(
                "settings.server.port '{}' must be an integer in range 0-65535",
                server.port
            ));
        }
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }
    if metrics.path == "/token" {
        errors.push("settings.metrics.path must not collide with '/token'".to_string());
    }

    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_retry(path: &str, settings: &SettingsConfig, errors: &mut Vec<String>) {
    let retry = settings.retry.as_ref();
    if retry.and_then(|r| r.initial_backoff_seconds) == Some(0) {
        errors.push(format!("{}.initial_backoff_seconds must be > 0", path));
    }
    // compare resolved values, a lone initial must still fit under the default cap
    let lifecycle = settings.lifecycle();
    if lifecycle.max_backoff < lifecycle.initial_backoff {
        errors.push(format!(
            "{}.max_backoff_seconds ({}) must be >= initial_backoff_seconds ({})",
            path,
            lifecycle.max_backoff.as_secs(),
            lifecycle.initial_backoff.as_secs()
        ));
    }
}

/// CONNECTION VALIDATION
fn validate_connection(connection: &ConnectionConfig, errors: &mut Vec<String>) {
    for field in connection.missing_fields() {
        errors.push(format!("connection.{} is required", field));
    }

    if let Some(scheme) = &connection.scheme {
        if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
            errors.push(format!(
                "connection.scheme '{}' invalid; allowed: {:?}",
                scheme, SUPPORTED_SCHEMES
            ));
        }
    }

    if let Some(realm) = &connection.realm {
        if realm.contains('/') {
            errors.push(format!("connection.realm '{}' must not contain '/'", realm));
        }
    }
}
