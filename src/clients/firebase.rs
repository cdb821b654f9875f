use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::error::AuthError;
use crate::cache::token_cache::TokenCache;
use crate::clients::models::FirebaseUser;
use crate::config::services::FirebaseConfig;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::sources::{PasswordLoginSource, ServiceAccountSource};

const API: &str = "firebase";

#[derive(Debug, Error)]
pub enum FirebaseError {
    #[error("firebase user not found: {0}")]
    UserNotFound(String),

    #[error("firebase request '{operation}' failed. status: {status}; message: {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("unexpected firebase response: {0}")]
    Response(String),

    #[error("failed to get firebase token: {0}")]
    Auth(#[from] AuthError),

    #[error("firebase request failed: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<FirebaseUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    local_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageObject {
    name: String,
    download_tokens: Option<String>,
}

/// Firebase auth admin calls and avatar storage.
///
/// Admin calls go through the Identity Toolkit REST API with a service
/// account token; uploads use a Firebase user id token.
pub struct FirebaseClient {
    client: Client,
    config: FirebaseConfig,
    admin_tokens: TokenCache<ServiceAccountSource>,
    storage_tokens: TokenCache<PasswordLoginSource>,
}

impl FirebaseClient {
    pub fn new(
        client: Client,
        config: FirebaseConfig,
        admin_tokens: TokenCache<ServiceAccountSource>,
        storage_tokens: TokenCache<PasswordLoginSource>,
    ) -> Self {
        Self { client, config, admin_tokens, storage_tokens }
    }

    // -------------------------------
    // AUTH
    // -------------------------------

    pub async fn get_user(&self, uid: &str) -> Result<FirebaseUser, FirebaseError> {
        self.lookup(json!({ "localId": [uid] }))
            .await?
            .ok_or_else(|| FirebaseError::UserNotFound(uid.to_owned()))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<FirebaseUser>, FirebaseError> {
        self.lookup(json!({ "email": [email] })).await
    }

    /// Set `photoUrl`, carrying over the user's current email, verification,
    /// disabled flag and display name.
    pub async fn update_user_image(&self, uid: &str, image_url: &str) -> Result<FirebaseUser, FirebaseError> {
        let user = self.get_user(uid).await?;

        let mut body = Map::new();
        body.insert("localId".into(), json!(uid));
        if let Some(email) = &user.email {
            body.insert("email".into(), json!(email));
        }
        body.insert("emailVerified".into(), json!(user.email_verified));
        body.insert("disableUser".into(), json!(user.disabled));
        if let Some(display_name) = &user.display_name {
            body.insert("displayName".into(), json!(display_name));
        }
        body.insert("photoUrl".into(), json!(image_url));

        self.admin_post("update_user_image", "accounts:update", Value::Object(body))
            .await?;

        Ok(FirebaseUser { photo_url: Some(image_url.to_owned()), ..user })
    }

    /// Create a verified user with a random password and the `User` role.
    pub async fn create_empty_user(&self, email: &str) -> Result<String, FirebaseError> {
        let mut body = Map::new();
        body.insert("email".into(), json!(email));
        body.insert("emailVerified".into(), json!(true));
        body.insert("disabled".into(), json!(false));
        body.insert("password".into(), json!(Uuid::new_v4().simple().to_string()));
        body.insert("displayName".into(), json!(display_name_from_email(email)));
        if let Some(photo_url) = &self.config.default_photo_url {
            body.insert("photoUrl".into(), json!(photo_url));
        }

        let response = self
            .admin_post("create_user", "accounts", Value::Object(body))
            .await?;
        let created: CreateResponse = serde_json::from_value(response)
            .map_err(|e| FirebaseError::Response(format!("create user: {}", e)))?;

        let claims = json!({ "role": ["User"] }).to_string();
        self.admin_post(
            "set_custom_claims",
            "accounts:update",
            json!({ "localId": created.local_id, "customAttributes": claims }),
        )
        .await?;

        info!(email, uid = %created.local_id, "created firebase user");
        Ok(created.local_id)
    }

    // -------------------------------
    // STORAGE
    // -------------------------------

    /// Upload an avatar under the avatar folder and return its download url.
    pub async fn upload_user_avatar(&self, image: Vec<u8>, filename: &str) -> Result<String, FirebaseError> {
        let token = self.storage_tokens.get_token().await?;
        let object_name = format!("{}/{}", self.config.avatar_folder.trim_end_matches('/'), filename);
        let storage_url = self.config.storage_url.trim_end_matches('/');
        let url = format!("{}/v0/b/{}/o", storage_url, self.config.bucket);

        let start = get_instant();
        let request = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object_name.as_str())])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, self.config.avatar_content_type.as_str())
            .body(image);
        let result = match request.send().await {
            Ok(response) => check_status("upload_user_avatar", response)
                .await
                .and_then(|body| {
                    serde_json::from_value::<StorageObject>(body)
                        .map_err(|e| FirebaseError::Response(format!("upload avatar: {}", e)))
                }),
            Err(e) => Err(FirebaseError::from(e)),
        };
        get_metrics().await.observe_api(API, "upload_user_avatar", result.is_ok(), start.elapsed());

        let object = result?;
        let download_token = object
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| FirebaseError::Response(format!("no download token for '{}'", object.name)))?;

        Ok(format!(
            "{}/v0/b/{}/o/{}?alt=media&token={}",
            storage_url,
            self.config.bucket,
            urlencoding::encode(&object.name),
            download_token
        ))
    }

    // -------------------------------
    // HELPERS
    // -------------------------------

    async fn lookup(&self, body: Value) -> Result<Option<FirebaseUser>, FirebaseError> {
        let response = self.admin_post("lookup", "accounts:lookup", body).await?;
        if response.is_null() {
            return Ok(None);
        }
        let lookup: LookupResponse = serde_json::from_value(response)
            .map_err(|e| FirebaseError::Response(format!("lookup: {}", e)))?;
        Ok(lookup.users.into_iter().next())
    }

    async fn admin_post(&self, operation: &'static str, method: &str, body: Value) -> Result<Value, FirebaseError> {
        let token = self.admin_tokens.get_token().await?;
        let url = format!(
            "{}/v1/projects/{}/{}",
            self.config.identity_url.trim_end_matches('/'),
            self.config.project_id,
            method
        );
        debug!(operation, url = %url, "firebase admin request");

        let start = get_instant();
        let result = match self.client.post(&url).bearer_auth(token).json(&body).send().await {
            Ok(response) => check_status(operation, response).await,
            Err(e) => Err(FirebaseError::from(e)),
        };
        get_metrics().await.observe_api(API, operation, result.is_ok(), start.elapsed());
        result
    }
}

async fn check_status(operation: &'static str, response: reqwest::Response) -> Result<Value, FirebaseError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FirebaseError::Status { operation, status, body });
    }
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| FirebaseError::Response(format!("{}: {}", operation, e)))
}

/// `john.smith@leverx.com` -> `John Smith`
pub fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    local
        .split('.')
        .filter(|part| !part.is_empty())
        .take(2)
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
