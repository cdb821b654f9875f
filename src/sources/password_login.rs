use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::cache::error::AuthError;
use crate::config::sources::PasswordLoginConfig;
use crate::parser::parser::parse_login_response;
use crate::secrets::{load_credentials, require_secret, SecretStore};
use crate::sources::{FetchedToken, TokenSource};

/// Email/password login posted as JSON: LES and Firebase `signInWithPassword`.
#[derive(Clone)]
pub struct PasswordLoginSource {
    name: String,
    client: Client,
    config: PasswordLoginConfig,
    secrets: Arc<dyn SecretStore>,
}

impl PasswordLoginSource {
    pub fn new(
        name: impl Into<String>,
        client: Client,
        config: PasswordLoginConfig,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self { name: name.into(), client, config, secrets }
    }

    pub fn config(&self) -> &PasswordLoginConfig {
        &self.config
    }
}

impl TokenSource for PasswordLoginSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_token(&self) -> Result<FetchedToken, AuthError> {
        let config = &self.config;

        // -------------------------------
        // 1. Resolve secrets before touching the network
        // -------------------------------

        let credentials = load_credentials(self.secrets.as_ref(), &config.credentials_key)?;
        let api_key = match &config.api_key {
            Some(api_key) => Some((
                api_key.query_param.as_str(),
                require_secret(self.secrets.as_ref(), &api_key.secret_key)?,
            )),
            None => None,
        };

        // -------------------------------
        // 2. Build body
        // -------------------------------

        let mut body: HashMap<&str, Value> = config
            .extra_body
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        body.insert(config.identifier_field.as_str(), Value::String(credentials.identifier));
        body.insert(config.secret_field.as_str(), Value::String(credentials.secret));

        let mut request = self.client.post(&config.url).json(&body);
        if let Some((param, key)) = &api_key {
            request = request.query(&[(param, key)]);
        }

        // -------------------------------
        // 3. Login
        // -------------------------------

        debug!(source = %self.name, url = %config.url, "posting login request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Authentication(format!(
                "login request to '{}' failed: {}",
                self.name, status
            )));
        }

        let body = response.text().await?;
        parse_login_response(
            &body,
            &config.token_pointer,
            config.ttl_pointer.as_deref(),
            config.ttl_unit,
        )
    }
}
