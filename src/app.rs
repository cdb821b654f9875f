use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::info;

use crate::cache::token_cache::TokenCache;
use crate::clients::{BaseDataClient, FirebaseClient, LesClient};
use crate::config::sources::{AppConfig, PasswordLoginConfig};
use crate::secrets::{build_secret_store, SecretStore};
use crate::sources::{PasswordLoginSource, ServiceAccountSource};
use crate::sync::{AvatarSync, WorkflowSettings};
use crate::utils::constants::DEFAULT_HTTP_TIMEOUT_MS;

pub type App = AvatarSync<BaseDataClient, LesClient, FirebaseClient>;

pub fn build_http_client(app_config: &AppConfig) -> Result<Client> {
    let timeout_ms = app_config.settings.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);
    Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

/// Wire clients and their token caches from config, with the configured secret store.
pub fn build(app_config: &AppConfig) -> Result<App> {
    let secrets = build_secret_store(&app_config.secrets);
    let client = build_http_client(app_config)?;
    build_with(app_config, client, secrets)
}

pub fn build_with(app_config: &AppConfig, client: Client, secrets: Arc<dyn SecretStore>) -> Result<App> {
    let providers = &app_config.providers;
    let services = &app_config.services;

    let password_cache = |name: &str, cfg: &PasswordLoginConfig| -> Result<TokenCache<PasswordLoginSource>> {
        let source = PasswordLoginSource::new(name, client.clone(), cfg.clone(), secrets.clone());
        let cache = TokenCache::new(source);
        match cfg.fallback_ttl_seconds {
            Some(seconds) => {
                let ttl = i64::try_from(seconds)
                    .ok()
                    .and_then(chrono::Duration::try_seconds)
                    .ok_or_else(|| anyhow!("{}: fallback_ttl_seconds {} is out of range", name, seconds))?;
                Ok(cache.fallback_ttl(ttl))
            }
            None => Ok(cache),
        }
    };

    let base_data = BaseDataClient::new(
        client.clone(),
        &services.base_data.url,
        password_cache("base_data", &providers.firebase)?,
    );
    let les = LesClient::new(client.clone(), &services.les.url, password_cache("les", &providers.les)?);
    let firebase = FirebaseClient::new(
        client.clone(),
        services.firebase.clone(),
        TokenCache::new(ServiceAccountSource::new(
            "firebase_admin",
            client.clone(),
            providers.service_account.clone(),
            secrets.clone(),
        )),
        password_cache("firebase_storage", &providers.firebase)?,
    );

    let settings = WorkflowSettings::from_settings(&app_config.settings)?;
    info!(dry_run = settings.dry_run, "application wired");
    Ok(AvatarSync::new(base_data, les, firebase, settings))
}
