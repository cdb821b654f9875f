use crate::config::settings::{LogFormat, LoggingConfig};
use crate::config::sources::AppConfig;
use crate::utils::constants::{DEFAULT_EMAIL_PATTERN, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_LOG_LEVEL};

pub fn initiate_default_values(mut config: AppConfig) -> AppConfig {
    let settings = &mut config.settings;

    if settings.logging.is_none() {
        settings.logging = Some(LoggingConfig::new(DEFAULT_LOG_LEVEL.to_owned(), LogFormat::from_env()));
    }
    if settings.http_timeout_ms.is_none() {
        settings.http_timeout_ms = Some(DEFAULT_HTTP_TIMEOUT_MS);
    }
    if settings.email_pattern.is_none() {
        settings.email_pattern = Some(DEFAULT_EMAIL_PATTERN.to_owned());
    }

    // trailing slashes are trimmed here once so clients can join paths blindly
    let services = &mut config.services;
    trim_url(&mut services.base_data.url);
    trim_url(&mut services.les.url);
    trim_url(&mut services.firebase.identity_url);
    trim_url(&mut services.firebase.storage_url);

    config
}

fn trim_url(url: &mut String) {
    while url.ends_with('/') {
        url.pop();
    }
}
