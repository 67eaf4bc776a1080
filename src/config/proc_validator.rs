//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates server / metrics / logging settings
//! - Validates issuer invariants: validity window, secret source, key length
//! - Validates the editor callback URL

use std::path::Path;

use tracing::{error, info};

use crate::config::issuer::{EditorSettings, IssuerConfig, SecretSource};
use crate::config::service::ServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{LOG_LEVELS, MAX_VALIDITY_MINUTES_LIMIT, MIN_SECRET_BYTES_FLOOR};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_issuer(&cfg.issuer, &mut errors);
    validate_editor(&cfg.editor, &mut errors);

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
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

/// ISSUER INVARIANTS
fn validate_issuer(issuer: &IssuerConfig, errors: &mut Vec<String>) {
    if issuer.default_validity_minutes == 0 {
        errors.push("issuer.default_validity_minutes must be > 0".to_string());
    }
    if issuer.max_validity_minutes > MAX_VALIDITY_MINUTES_LIMIT {
        errors.push(format!(
            "issuer.max_validity_minutes ({}) is unreasonably large; limit is {}",
            issuer.max_validity_minutes, MAX_VALIDITY_MINUTES_LIMIT
        ));
    }
    if issuer.default_validity_minutes > issuer.max_validity_minutes {
        errors.push(format!(
            "issuer.default_validity_minutes ({}) must be <= max_validity_minutes ({})",
            issuer.default_validity_minutes, issuer.max_validity_minutes
        ));
    }
    if issuer.min_secret_bytes < MIN_SECRET_BYTES_FLOOR {
        errors.push(format!(
            "issuer.min_secret_bytes ({}) must be >= {}",
            issuer.min_secret_bytes, MIN_SECRET_BYTES_FLOOR
        ));
    }

    match &issuer.secret.source {
        SecretSource::Literal { value } => {
            if value.is_empty() {
                errors.push("issuer.secret.value must not be empty".to_string());
            }
        }
        SecretSource::FromEnv { from_env } => {
            if from_env.trim().is_empty() {
                errors.push("issuer.secret.from_env must name a variable".to_string());
            }
        }
        SecretSource::FromFile { path } => {
            if !Path::new(path).is_absolute() {
                errors.push(format!(
                    "issuer.secret.path '{}' must be an absolute path",
                    path
                ));
            }
        }
    }
}

fn validate_editor(editor: &EditorSettings, errors: &mut Vec<String>) {
    if let Some(callback_url) = &editor.callback_url {
        let valid = callback_url
            .parse::<http::Uri>()
            .ok()
            .filter(|uri| matches!(uri.scheme_str(), Some("http") | Some("https")))
            .filter(|uri| uri.authority().is_some())
            .is_some();
        if !valid {
            errors.push(format!(
                "editor.callback_url '{}' must be an absolute http(s) URL",
                callback_url
            ));
        }
    }
}
