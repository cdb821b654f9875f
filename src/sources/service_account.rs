use std::fs;
use std::sync::Arc;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::error::AuthError;
use crate::config::sources::{ServiceAccountConfig, TtlUnit, SERVICE_KEY_PLACEHOLDER};
use crate::helpers::time::now_i64;
use crate::parser::parser::parse_login_response;
use crate::secrets::{require_secret, SecretStore};
use crate::sources::{FetchedToken, TokenSource};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Subset of a Google service account key file.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// OAuth2 JWT-bearer grant with a service account key, used for
/// Firebase admin calls against the Identity Toolkit API.
#[derive(Clone)]
pub struct ServiceAccountSource {
    name: String,
    client: Client,
    config: ServiceAccountConfig,
    secrets: Arc<dyn SecretStore>,
}

impl ServiceAccountSource {
    pub fn new(
        name: impl Into<String>,
        client: Client,
        config: ServiceAccountConfig,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self { name: name.into(), client, config, secrets }
    }

    /// Read the key file, filling in the private key placeholder from the secret store.
    pub fn load_key(&self) -> Result<ServiceAccountKey, AuthError> {
        let mut raw = fs::read_to_string(&self.config.path).map_err(|e| {
            AuthError::Configuration(format!(
                "failed to read service account file '{}': {}",
                self.config.path, e
            ))
        })?;

        if raw.contains(SERVICE_KEY_PLACEHOLDER) {
            let secret_key = self.config.private_key_secret.as_deref().ok_or_else(|| {
                AuthError::Configuration(format!(
                    "service account file contains {} but no private_key_secret is configured",
                    SERVICE_KEY_PLACEHOLDER
                ))
            })?;
            let private_key = require_secret(self.secrets.as_ref(), secret_key)?;
            raw = raw.replace(SERVICE_KEY_PLACEHOLDER, &private_key);
        }

        serde_json::from_str(&raw).map_err(|e| {
            AuthError::Configuration(format!("invalid service account file: {}", e))
        })
    }

    fn sign_assertion(&self, key: &ServiceAccountKey, token_url: &str) -> Result<String, AuthError> {
        let iat = now_i64();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: self.config.scopes.join(" "),
            aud: token_url,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AuthError::Configuration(format!("invalid service account private key: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| AuthError::Configuration(format!("failed to sign assertion: {}", e)))
    }
}

impl TokenSource for ServiceAccountSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_token(&self) -> Result<FetchedToken, AuthError> {
        let key = self.load_key()?;
        let token_url = self
            .config
            .token_url
            .clone()
            .or_else(|| key.token_uri.clone())
            .ok_or_else(|| {
                AuthError::Configuration("service account has no token_uri and no token_url is configured".to_owned())
            })?;
        let assertion = self.sign_assertion(&key, &token_url)?;

        debug!(source = %self.name, url = %token_url, "requesting service account token");
        let response = self
            .client
            .post(&token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Authentication(format!(
                "service account token request failed: {}",
                status
            )));
        }

        let body = response.text().await?;
        parse_login_response(&body, "/access_token", Some("/expires_in"), TtlUnit::Seconds)
    }
}
