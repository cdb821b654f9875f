use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::cache::error::AuthError;
use crate::cache::token_cache::TokenCache;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::sources::PasswordLoginSource;

const AVATAR_PATH: &str = "api/employees/employee-avatar";
const API: &str = "les";

#[derive(Debug, Error)]
pub enum LesError {
    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("failed to fetch image from LES. status: {status}; message: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to get LES user avatar: response has no avatar url")]
    MissingAvatar,

    #[error("failed to get LES token: {0}")]
    Auth(#[from] AuthError),

    #[error("LES request failed: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct LesPictureDto {
    user: Option<LesUserDto>,
}

// also carries first_name, last_name and email, unused here
#[derive(Debug, Deserialize)]
struct LesUserDto {
    user_avatar: Option<String>,
}

/// LES employee API, source of avatar images.
pub struct LesClient {
    client: Client,
    base_url: String,
    tokens: TokenCache<PasswordLoginSource>,
}

impl LesClient {
    pub fn new(client: Client, base_url: &str, tokens: TokenCache<PasswordLoginSource>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens,
        }
    }

    /// Download the avatar of `email` into memory.
    pub async fn get_user_picture(&self, email: &str) -> Result<Vec<u8>, LesError> {
        let token = self.tokens.get_token().await.inspect_err(|e| {
            error!("failed to fetch LES token: {}", e);
        })?;

        let start = get_instant();
        let result = self.download_picture(&token, email).await;
        let ok = matches!(result, Ok(_) | Err(LesError::ImageNotFound(_)));
        get_metrics().await.observe_api(API, "get_user_picture", ok, start.elapsed());

        result
    }

    async fn download_picture(&self, token: &str, email: &str) -> Result<Vec<u8>, LesError> {
        let url = format!("{}/{}/{}", self.base_url, AVATAR_PATH, email);
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LesError::ImageNotFound(email.to_owned()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = LesError::Status { status, body };
            error!("{}", err);
            return Err(err);
        }

        let picture: LesPictureDto = response.json().await?;
        let avatar_url = picture
            .user
            .and_then(|user| user.user_avatar)
            .ok_or(LesError::MissingAvatar)?;

        // avatar urls are public, no bearer
        debug!(email, avatar_url = %avatar_url, "downloading avatar");
        let image = self
            .client
            .get(&avatar_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(image.to_vec())
    }
}
