//! Avatar and email workflows.
//!
//! The workflows only see the three traits below, so they run the same
//! against the real clients and against in-memory fakes. Every question that
//! used to be an inline console prompt goes through a `ConfirmationPolicy`.

use std::future::Future;

use anyhow::Result;
use regex::Regex;

use crate::clients::{BaseDataClient, FirebaseClient, FirebaseError, FirebaseUser, LesClient, LesError, UserProfile};
use crate::config::settings::SettingsConfig;
use crate::utils::constants::{DEFAULT_EMAIL_PATTERN, DRY_RUN_IMAGE_URL};

pub mod confirm;
pub mod update_images;
pub mod validate_emails;

pub use confirm::{ConfirmationPolicy, ConsolePolicy, Decision, FixedPolicy, ScriptedPolicy};
pub use update_images::UpdateImagesReport;
pub use validate_emails::ValidateEmailsReport;

pub trait ProfileStore: Send + Sync {
    fn get_all_users(&self) -> impl Future<Output = Result<Vec<UserProfile>>> + Send;
    fn update_user(&self, user: &UserProfile) -> impl Future<Output = Result<()>> + Send;
}

pub trait AvatarSource: Send + Sync {
    fn get_user_picture(&self, email: &str) -> impl Future<Output = Result<Vec<u8>, LesError>> + Send;
}

pub trait IdentityStore: Send + Sync {
    fn get_user(&self, uid: &str) -> impl Future<Output = Result<FirebaseUser, FirebaseError>> + Send;
    fn update_user_image(
        &self,
        uid: &str,
        image_url: &str,
    ) -> impl Future<Output = Result<FirebaseUser, FirebaseError>> + Send;
    fn upload_user_avatar(
        &self,
        image: Vec<u8>,
        filename: &str,
    ) -> impl Future<Output = Result<String, FirebaseError>> + Send;
}

impl ProfileStore for BaseDataClient {
    async fn get_all_users(&self) -> Result<Vec<UserProfile>> {
        BaseDataClient::get_all_users(self).await
    }

    async fn update_user(&self, user: &UserProfile) -> Result<()> {
        BaseDataClient::update_user(self, user).await
    }
}

impl AvatarSource for LesClient {
    async fn get_user_picture(&self, email: &str) -> Result<Vec<u8>, LesError> {
        LesClient::get_user_picture(self, email).await
    }
}

impl IdentityStore for FirebaseClient {
    async fn get_user(&self, uid: &str) -> Result<FirebaseUser, FirebaseError> {
        FirebaseClient::get_user(self, uid).await
    }

    async fn update_user_image(&self, uid: &str, image_url: &str) -> Result<FirebaseUser, FirebaseError> {
        FirebaseClient::update_user_image(self, uid, image_url).await
    }

    async fn upload_user_avatar(&self, image: Vec<u8>, filename: &str) -> Result<String, FirebaseError> {
        FirebaseClient::upload_user_avatar(self, image, filename).await
    }
}

/// Knobs the workflows need from `settings`.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub dry_run: bool,
    pub les_fetch_delay_ms: u64,
    pub les_fetch_delay_random_delta_ms: u64,
    pub avatar_filename_template: String,
    pub email_pattern: Regex,
    pub dry_run_image_url: String,
}

impl WorkflowSettings {
    pub fn from_settings(settings: &SettingsConfig) -> Result<Self> {
        let pattern = settings.email_pattern.as_deref().unwrap_or(DEFAULT_EMAIL_PATTERN);
        Ok(Self {
            dry_run: settings.dry_run,
            les_fetch_delay_ms: (settings.les_fetch_delay_sec.max(0.0) * 1000.0) as u64,
            les_fetch_delay_random_delta_ms: settings.les_fetch_delay_random_delta_ms,
            avatar_filename_template: settings.avatar_filename_template.clone(),
            email_pattern: Regex::new(pattern)?,
            dry_run_image_url: DRY_RUN_IMAGE_URL.to_owned(),
        })
    }
}

/// Orchestrates the workflows over a profile store, an avatar source and an identity store.
pub struct AvatarSync<P, A, I> {
    pub profiles: P,
    pub avatars: A,
    pub identity: I,
    pub settings: WorkflowSettings,
}

impl<P, A, I> AvatarSync<P, A, I>
where
    P: ProfileStore,
    A: AvatarSource,
    I: IdentityStore,
{
    pub fn new(profiles: P, avatars: A, identity: I, settings: WorkflowSettings) -> Self {
        Self { profiles, avatars, identity, settings }
    }
}
