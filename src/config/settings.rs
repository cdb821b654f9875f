use serde::Deserialize;

/// ================================
/// Global settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// Suppress every mutating network call.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub les_fetch_delay_sec: f64,
    #[serde(default)]
    pub les_fetch_delay_random_delta_ms: u64,
    /// `{{email}}` is replaced with the user's email.
    #[serde(default = "default_avatar_filename_template")]
    pub avatar_filename_template: String,
    pub email_pattern: Option<String>,
    pub http_timeout_ms: Option<u64>,
    pub logging: Option<LoggingConfig>,
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

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

fn default_avatar_filename_template() -> String {
    "{{email}}".to_string()
}
