use serde::Deserialize;
use std::collections::HashMap;

use crate::config::services::ServicesConfig;
use crate::config::settings::SettingsConfig;

/// ================================
/// Full application configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub settings: SettingsConfig,
    pub secrets: SecretsConfig,
    pub providers: ProvidersConfig,
    pub services: ServicesConfig,
}

/// ================================
/// Secret store
/// ================================
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SecretsConfig {
    /// Process environment, key normalized to SCREAMING_SNAKE_CASE.
    Env,
    /// YAML or JSON map of key -> value.
    File { path: String },
}

/// ================================
/// Token providers
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub les: PasswordLoginConfig,
    pub firebase: PasswordLoginConfig,
    pub service_account: ServiceAccountConfig,
}

/// Login with an `identifier#secret` credential posted as JSON.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordLoginConfig {
    pub url: String,
    /// Secret store key holding `identifier#secret`.
    pub credentials_key: String,
    /// Optional API key appended to the login url as a query parameter.
    pub api_key: Option<ApiKeyConfig>,
    #[serde(default = "default_identifier_field")]
    pub identifier_field: String,
    #[serde(default = "default_secret_field")]
    pub secret_field: String,
    /// Constant fields merged into the login body.
    #[serde(default)]
    pub extra_body: HashMap<String, serde_json::Value>,
    /// JSON pointer to the token in the login response, e.g. `/token`.
    pub token_pointer: String,
    /// JSON pointer to the TTL; absent means the fallback TTL applies.
    pub ttl_pointer: Option<String>,
    #[serde(default)]
    pub ttl_unit: TtlUnit,
    pub fallback_ttl_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiKeyConfig {
    pub secret_key: String,
    #[serde(default = "default_api_key_param")]
    pub query_param: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TtlUnit {
    #[default]
    Seconds,
    Milliseconds,
}

/// Google service account used for Firebase admin calls.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceAccountConfig {
    /// Service account JSON file.
    pub path: String,
    /// Secret substituted for `{PLACE_SERVICE_KEY}` in the file, when present.
    pub private_key_secret: Option<String>,
    /// Overrides `token_uri` from the service account file.
    pub token_url: Option<String>,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

pub const SERVICE_KEY_PLACEHOLDER: &str = "{PLACE_SERVICE_KEY}";

fn default_identifier_field() -> String {
    "email".to_owned()
}

fn default_secret_field() -> String {
    "password".to_owned()
}

fn default_api_key_param() -> String {
    "key".to_owned()
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/cloud-platform".to_owned(),
        "https://www.googleapis.com/auth/identitytoolkit".to_owned(),
    ]
}
