//! Secret lookup by well-known key.
//!
//! Credentials are read at refresh time and never kept around; the token
//! cache only stores what the login endpoint hands back.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::cache::error::AuthError;
use crate::config::sources::SecretsConfig;

pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Reads secrets from the process environment.
///
/// `les-integration-user` is looked up as `LES_INTEGRATION_USER`.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn env_key(key: &str) -> String {
        key.chars()
            .map(|c| match c {
                '-' | '.' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let env_key = Self::env_key(key);
        debug!(key, env_key = %env_key, "reading secret from env");
        match std::env::var(&env_key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(anyhow!("secret '{}' is not valid unicode: {}", key, err)),
        }
    }
}

/// Secrets kept in a YAML (or JSON) map file, read on every lookup.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| anyhow!("failed to read secrets file {}: {}", self.path.display(), e))?;
        // serde_yaml also accepts JSON
        let mut secrets: HashMap<String, String> = serde_yaml::from_str(&content)
            .map_err(|e| anyhow!("invalid secrets file {}: {}", self.path.display(), e))?;
        Ok(secrets.remove(key))
    }
}

/// In-memory store, handy for wiring and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl SecretStore for StaticSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.secrets.get(key).cloned())
    }
}

pub fn build_secret_store(config: &SecretsConfig) -> Arc<dyn SecretStore> {
    match config {
        SecretsConfig::Env => Arc::new(EnvSecretStore),
        SecretsConfig::File { path } => Arc::new(FileSecretStore::new(path)),
    }
}

/// `identifier#secret`
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub identifier: String,
    pub secret: String,
}

impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .finish()
    }
}

/// Split a credential string into exactly two parts on `#`.
pub fn parse_credentials(raw: &str) -> Result<CredentialPair, AuthError> {
    let parts: Vec<&str> = raw.split('#').collect();
    match parts.as_slice() {
        [identifier, secret] => Ok(CredentialPair {
            identifier: (*identifier).to_owned(),
            secret: (*secret).to_owned(),
        }),
        _ => Err(AuthError::Configuration(format!(
            "credential string must split into 2 parts on '#', got {}",
            parts.len()
        ))),
    }
}

/// Fetch a required secret, mapping every failure to a configuration error.
pub fn require_secret(store: &dyn SecretStore, key: &str) -> Result<String, AuthError> {
    store
        .get(key)
        .map_err(|e| AuthError::Configuration(format!("failed to read secret '{}': {}", key, e)))?
        .ok_or_else(|| AuthError::Configuration(format!("secret '{}' is missing", key)))
}

/// Look up and parse the credential pair stored under `key`.
pub fn load_credentials(store: &dyn SecretStore, key: &str) -> Result<CredentialPair, AuthError> {
    let raw = require_secret(store, key)?;
    parse_credentials(raw.trim()).map_err(|e| match e {
        AuthError::Configuration(msg) => {
            AuthError::Configuration(format!("invalid credentials under '{}': {}", key, msg))
        }
        other => other,
    })
}
