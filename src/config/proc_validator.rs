//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * settings invariants (delays, filename template, email pattern, logging)
//!   * login providers (urls, secret keys, JSON pointers, TTLs)
//!   * downstream services (urls, firebase project and bucket)

use regex::Regex;
use reqwest::Url;
use tracing::{error, info};

use crate::config::services::ServicesConfig;
use crate::config::settings::SettingsConfig;
use crate::config::sources::{AppConfig, PasswordLoginConfig, SecretsConfig, ServiceAccountConfig};
use crate::utils::constants::{EMAIL_PLACEHOLDER, MAX_FALLBACK_TTL_SECONDS};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_app_config(cfg: &AppConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_secrets(&cfg.secrets, &mut errors);
    validate_password_login("providers.les", &cfg.providers.les, &mut errors);
    validate_password_login("providers.firebase", &cfg.providers.firebase, &mut errors);
    validate_service_account("providers.service_account", &cfg.providers.service_account, &mut errors);
    validate_services(&cfg.services, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        for e in &errors {
            error!("config error: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if !settings.les_fetch_delay_sec.is_finite() || settings.les_fetch_delay_sec < 0.0 {
        errors.push(format!(
            "settings.les_fetch_delay_sec must be a non-negative number, got {}",
            settings.les_fetch_delay_sec
        ));
    }

    if !settings.avatar_filename_template.contains(EMAIL_PLACEHOLDER) {
        errors.push(format!(
            "settings.avatar_filename_template must contain {} so every user gets its own file",
            EMAIL_PLACEHOLDER
        ));
    }

    if let Some(pattern) = &settings.email_pattern {
        if let Err(e) = Regex::new(pattern) {
            errors.push(format!("settings.email_pattern is not a valid regex: {}", e));
        }
    }

    if settings.http_timeout_ms == Some(0) {
        errors.push("settings.http_timeout_ms must be > 0".to_owned());
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' is not one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_secrets(secrets: &SecretsConfig, errors: &mut Vec<String>) {
    if let SecretsConfig::File { path } = secrets {
        if path.trim().is_empty() {
            errors.push("secrets.path must not be empty for a file secret store".to_owned());
        }
    }
}

fn validate_password_login(name: &str, cfg: &PasswordLoginConfig, errors: &mut Vec<String>) {
    validate_url(&format!("{}.url", name), &cfg.url, errors);

    if cfg.credentials_key.trim().is_empty() {
        errors.push(format!("{}.credentials_key must not be empty", name));
    }
    if let Some(api_key) = &cfg.api_key {
        if api_key.secret_key.trim().is_empty() {
            errors.push(format!("{}.api_key.secret_key must not be empty", name));
        }
    }
    if cfg.identifier_field == cfg.secret_field {
        errors.push(format!(
            "{}: identifier_field and secret_field must differ, both are '{}'",
            name, cfg.identifier_field
        ));
    }

    validate_pointer(&format!("{}.token_pointer", name), &cfg.token_pointer, errors);
    if let Some(pointer) = &cfg.ttl_pointer {
        validate_pointer(&format!("{}.ttl_pointer", name), pointer, errors);
    }
    if let Some(seconds) = cfg.fallback_ttl_seconds {
        if seconds == 0 || seconds > MAX_FALLBACK_TTL_SECONDS {
            errors.push(format!(
                "{}.fallback_ttl_seconds must be between 1 and {}, got {}",
                name, MAX_FALLBACK_TTL_SECONDS, seconds
            ));
        }
    }
}

fn validate_service_account(name: &str, cfg: &ServiceAccountConfig, errors: &mut Vec<String>) {
    if cfg.path.trim().is_empty() {
        errors.push(format!("{}.path must not be empty", name));
    }
    if let Some(url) = &cfg.token_url {
        validate_url(&format!("{}.token_url", name), url, errors);
    }
    if cfg.scopes.is_empty() {
        errors.push(format!("{}.scopes must not be empty", name));
    }
}

fn validate_services(services: &ServicesConfig, errors: &mut Vec<String>) {
    validate_url("services.base_data.url", &services.base_data.url, errors);
    validate_url("services.les.url", &services.les.url, errors);

    let firebase = &services.firebase;
    validate_url("services.firebase.identity_url", &firebase.identity_url, errors);
    validate_url("services.firebase.storage_url", &firebase.storage_url, errors);
    if firebase.project_id.trim().is_empty() {
        errors.push("services.firebase.project_id must not be empty".to_owned());
    }
    if firebase.bucket.trim().is_empty() {
        errors.push("services.firebase.bucket must not be empty".to_owned());
    }
    if let Some(url) = &firebase.default_photo_url {
        validate_url("services.firebase.default_photo_url", url, errors);
    }
}

fn validate_url(field: &str, value: &str, errors: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!("{} must be http(s), got scheme '{}'", field, url.scheme())),
        Err(e) => errors.push(format!("{} '{}' is not a valid url: {}", field, value, e)),
    }
}

fn validate_pointer(field: &str, value: &str, errors: &mut Vec<String>) {
    if !value.starts_with('/') {
        errors.push(format!("{} '{}' must be a JSON pointer starting with '/'", field, value));
    }
}
