use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing::{debug, error};

use crate::cache::token_cache::TokenCache;
use crate::clients::models::UserProfile;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::sources::PasswordLoginSource;

const USER_PROFILES_PATH: &str = "user-profiles";
const API: &str = "base_data";

/// BaseData user-profile API, authenticated with a Firebase id token.
pub struct BaseDataClient {
    client: Client,
    base_url: String,
    tokens: TokenCache<PasswordLoginSource>,
}

impl BaseDataClient {
    pub fn new(client: Client, base_url: &str, tokens: TokenCache<PasswordLoginSource>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens,
        }
    }

    pub async fn get_all_users(&self) -> Result<Vec<UserProfile>> {
        let token = self
            .tokens
            .get_token()
            .await
            .context("failed to get BaseData token")?;

        let start = get_instant();
        let result = self.fetch_users(&token).await;
        get_metrics().await.observe_api(API, "get_all_users", result.is_ok(), start.elapsed());

        match result {
            Ok(users) => {
                debug!(count = users.len(), "fetched BaseData users");
                Ok(users)
            }
            Err(e) => {
                error!("{:#}", e);
                Err(e)
            }
        }
    }

    pub async fn update_user(&self, user: &UserProfile) -> Result<()> {
        let token = self
            .tokens
            .get_token()
            .await
            .context("failed to get BaseData token")?;

        let start = get_instant();
        let result = self.put_user(&token, user).await;
        get_metrics().await.observe_api(API, "update_user", result.is_ok(), start.elapsed());
        result
    }

    fn profiles_url(&self) -> String {
        format!("{}/{}", self.base_url, USER_PROFILES_PATH)
    }

    async fn fetch_users(&self, token: &str) -> Result<Vec<UserProfile>> {
        let response = self.client.get(self.profiles_url()).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("failed to get BaseData users: {} {}", status, body));
        }
        response
            .json::<Vec<UserProfile>>()
            .await
            .context("failed to parse BaseData users")
    }

    async fn put_user(&self, token: &str, user: &UserProfile) -> Result<()> {
        let response = self
            .client
            .put(self.profiles_url())
            .bearer_auth(token)
            .json(user)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "failed to update BaseData user '{}': {} {}",
                user.id.as_deref().unwrap_or_default(),
                status,
                body
            ));
        }
        Ok(())
    }
}
