// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use regex::Regex;
use reqwest::Client;

use crate::clients::{FirebaseError, FirebaseUser, LesError, UserProfile};
use crate::config::sources::{PasswordLoginConfig, TtlUnit};
use crate::sync::{AvatarSource, AvatarSync, IdentityStore, ProfileStore, WorkflowSettings};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Login config shaped like the LES one: `{email, password}` -> `{token, expires_in}` (seconds here).
pub fn login_config(url: &str, credentials_key: &str) -> PasswordLoginConfig {
    PasswordLoginConfig {
        url: url.to_owned(),
        credentials_key: credentials_key.to_owned(),
        api_key: None,
        identifier_field: "email".to_owned(),
        secret_field: "password".to_owned(),
        extra_body: HashMap::new(),
        token_pointer: "/token".to_owned(),
        ttl_pointer: Some("/expires_in".to_owned()),
        ttl_unit: TtlUnit::Seconds,
        fallback_ttl_seconds: None,
    }
}

/// Login server counting requests. Issues `token-<n>` valid for `ttl` seconds,
/// answers 500 while `failing` is set, and takes `delay` to answer.
pub struct LoginServer {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
    pub failing: Arc<AtomicBool>,
    pub handle: JoinHandle<()>,
}

impl LoginServer {
    pub async fn start(ttl: u64, delay: Duration) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let failing = Arc::new(AtomicBool::new(false));

        let router = Router::new().route("/login", post({
            let calls = calls.clone();
            let failing = failing.clone();
            move |Json(_): Json<serde_json::Value>| {
                let calls = calls.clone();
                let failing = failing.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    tokio::time::sleep(delay).await;
                    if failing.load(Ordering::SeqCst) {
                        (StatusCode::INTERNAL_SERVER_ERROR, "login failed".to_owned())
                    } else {
                        let body = json!({ "token": format!("token-{}", n), "expires_in": ttl }).to_string();
                        (StatusCode::OK, body)
                    }
                }
            }
        }));
        let (handle, addr) = spawn_axum(router).await;
        Self { addr, calls, failing, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}/login", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

// -------------------------------
// In-memory workflow fakes
// -------------------------------

pub fn profile(id: Option<&str>, email: Option<&str>) -> UserProfile {
    UserProfile {
        id: id.map(str::to_owned),
        full_name: email.map(|e| e.split('@').next().unwrap_or_default().replace('.', " ")),
        email: email.map(str::to_owned),
        ..UserProfile::default()
    }
}

pub fn workflow_settings(dry_run: bool) -> WorkflowSettings {
    WorkflowSettings {
        dry_run,
        les_fetch_delay_ms: 0,
        les_fetch_delay_random_delta_ms: 0,
        avatar_filename_template: "{{email}}.jpg".to_owned(),
        email_pattern: Regex::new(crate::utils::constants::DEFAULT_EMAIL_PATTERN).unwrap(),
        dry_run_image_url: crate::utils::constants::DRY_RUN_IMAGE_URL.to_owned(),
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    pub users: Vec<UserProfile>,
    pub updated: Mutex<Vec<UserProfile>>,
}

impl FakeProfiles {
    pub fn new(users: Vec<UserProfile>) -> Self {
        Self { users, updated: Mutex::new(Vec::new()) }
    }

    pub fn updated(&self) -> Vec<UserProfile> {
        self.updated.lock().unwrap().clone()
    }
}

impl ProfileStore for FakeProfiles {
    async fn get_all_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self.users.clone())
    }

    async fn update_user(&self, user: &UserProfile) -> Result<()> {
        self.updated.lock().unwrap().push(user.clone());
        Ok(())
    }
}

/// Serves `image-<email>` bytes; emails in `missing` answer ImageNotFound,
/// emails in `broken` answer a non-404 failure.
#[derive(Default)]
pub struct FakeAvatars {
    pub missing: Vec<String>,
    pub broken: Vec<String>,
    pub requested: Mutex<Vec<String>>,
}

impl AvatarSource for FakeAvatars {
    async fn get_user_picture(&self, email: &str) -> Result<Vec<u8>, LesError> {
        self.requested.lock().unwrap().push(email.to_owned());
        if self.missing.iter().any(|m| m == email) {
            return Err(LesError::ImageNotFound(email.to_owned()));
        }
        if self.broken.iter().any(|b| b == email) {
            return Err(LesError::MissingAvatar);
        }
        Ok(format!("image-{}", email).into_bytes())
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    pub users: HashMap<String, FirebaseUser>,
    pub uploads: Mutex<VecDeque<(String, Vec<u8>)>>,
    pub photo_updates: Mutex<Vec<(String, String)>>,
}

impl FakeIdentity {
    pub fn with_users(users: impl IntoIterator<Item = (&'static str, Option<&'static str>)>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|(uid, email)| {
                    (
                        uid.to_owned(),
                        FirebaseUser {
                            uid: uid.to_owned(),
                            email: email.map(str::to_owned),
                            ..FirebaseUser::default()
                        },
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().iter().cloned().collect()
    }

    pub fn photo_updates(&self) -> Vec<(String, String)> {
        self.photo_updates.lock().unwrap().clone()
    }
}

impl IdentityStore for FakeIdentity {
    async fn get_user(&self, uid: &str) -> Result<FirebaseUser, FirebaseError> {
        self.users
            .get(uid)
            .cloned()
            .ok_or_else(|| FirebaseError::UserNotFound(uid.to_owned()))
    }

    async fn update_user_image(&self, uid: &str, image_url: &str) -> Result<FirebaseUser, FirebaseError> {
        self.photo_updates.lock().unwrap().push((uid.to_owned(), image_url.to_owned()));
        Ok(FirebaseUser {
            uid: uid.to_owned(),
            photo_url: Some(image_url.to_owned()),
            ..FirebaseUser::default()
        })
    }

    async fn upload_user_avatar(&self, image: Vec<u8>, filename: &str) -> Result<String, FirebaseError> {
        self.uploads.lock().unwrap().push_back((filename.to_owned(), image));
        Ok(format!("https://storage.test/{}", filename))
    }
}

pub type FakeApp = AvatarSync<FakeProfiles, FakeAvatars, FakeIdentity>;

pub fn fake_app(users: Vec<UserProfile>, avatars: FakeAvatars, identity: FakeIdentity, dry_run: bool) -> FakeApp {
    AvatarSync::new(FakeProfiles::new(users), avatars, identity, workflow_settings(dry_run))
}
