use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clients::{LesError, UserProfile};
use crate::observability::metrics::get_metrics;
use crate::sync::{AvatarSource, AvatarSync, ConfirmationPolicy, Decision, IdentityStore, ProfileStore};
use crate::utils::constants::EMAIL_PLACEHOLDER;

const WORKFLOW: &str = "update_images";
pub const SKIP_MISSING_IMAGE_PROMPT: &str = "Skip? y/n/a(all)";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateImagesReport {
    pub users: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub uploaded: usize,
    pub profiles_updated: usize,
    pub identities_updated: usize,
    /// Bytes of image data held in memory after the fetch phase.
    pub memory_used: u64,
    /// Stopped by the operator at a skip prompt.
    pub aborted: bool,
}

struct UserImage {
    user: UserProfile,
    email: String,
    image: Vec<u8>,
}

impl<P, A, I> AvatarSync<P, A, I>
where
    P: ProfileStore,
    A: AvatarSource,
    I: IdentityStore,
{
    /// Copy every user's LES avatar into Firebase storage, then point the
    /// BaseData profile and the Firebase `photoUrl` at it.
    ///
    /// In dry run mode nothing is fetched from LES and no mutating call is made.
    pub async fn update_images<C: ConfirmationPolicy>(&self, policy: &mut C) -> Result<UpdateImagesReport> {
        let metrics = get_metrics().await;
        let dry_run = self.settings.dry_run;
        let mut report = UpdateImagesReport::default();

        info!("fetching all users from BaseData...");
        let users = self.profiles.get_all_users().await?;
        report.users = users.len();
        info!("fetched {} users", users.len());

        // -------------------------------
        // 1. Fetch images from LES
        // -------------------------------

        info!("fetching images from LES...");
        let mut images: Vec<UserImage> = Vec::with_capacity(users.len());
        let mut skip_missing = false;

        for user in users {
            let Some(email) = user.email.clone() else {
                warn!(id = user.id.as_deref().unwrap_or_default(), "user without email field, continuing...");
                report.skipped += 1;
                continue;
            };

            let image = if dry_run {
                Vec::new()
            } else {
                match self.avatars.get_user_picture(&email).await {
                    Ok(image) => image,
                    Err(LesError::ImageNotFound(_)) => {
                        warn!(email = %email, "image not found");
                        report.skipped += 1;
                        metrics.workflow_items.with_label_values(&[WORKFLOW, "not_found"]).inc();
                        if skip_missing {
                            continue;
                        }
                        match policy.confirm(SKIP_MISSING_IMAGE_PROMPT) {
                            Decision::All => skip_missing = true,
                            Decision::Yes => {}
                            Decision::No => {
                                info!("exiting...");
                                report.aborted = true;
                                metrics.workflow_runs.with_label_values(&[WORKFLOW, "aborted"]).inc();
                                return Ok(report);
                            }
                        }
                        continue;
                    }
                    Err(e) => {
                        metrics.workflow_runs.with_label_values(&[WORKFLOW, "failed"]).inc();
                        return Err(e.into());
                    }
                }
            };

            report.memory_used += image.len() as u64;
            report.fetched += 1;
            metrics.workflow_items.with_label_values(&[WORKFLOW, "fetched"]).inc();
            info!(email = %email, memory_used = report.memory_used, "fetched");
            images.push(UserImage { user, email, image });

            let delay = self.fetch_delay();
            debug!("waiting for {} ms...", delay.as_millis());
            sleep(delay).await;
        }

        // -------------------------------
        // 2. Upload to Firebase storage
        // -------------------------------

        info!("uploading images to firebase storage...");
        for item in images.iter_mut() {
            let url = if dry_run {
                self.settings.dry_run_image_url.clone()
            } else {
                let filename = self.avatar_filename(&item.email);
                let image = std::mem::take(&mut item.image);
                self.identity.upload_user_avatar(image, &filename).await?
            };
            info!("{} >> {}", item.email, url);
            item.user.image_url = Some(url);
            report.uploaded += 1;
        }

        // -------------------------------
        // 3. Update BaseData image urls
        // -------------------------------

        info!("updating database records for image urls...");
        for item in &images {
            if !dry_run {
                self.profiles.update_user(&item.user).await?;
            }
            info!("{}", item.email);
            report.profiles_updated += 1;
        }

        // -------------------------------
        // 4. Update Firebase photoUrl
        // -------------------------------

        info!("updating firebase 'photoUrl' claims...");
        for item in &images {
            let (Some(id), Some(url)) = (item.user.id.as_deref(), item.user.image_url.as_deref()) else {
                warn!(email = %item.email, "user without id, firebase photo not updated");
                continue;
            };
            if !dry_run {
                self.identity.update_user_image(id, url).await?;
            }
            info!("{}", item.email);
            report.identities_updated += 1;
            metrics.workflow_items.with_label_values(&[WORKFLOW, "updated"]).inc();
        }

        metrics.workflow_runs.with_label_values(&[WORKFLOW, "done"]).inc();
        info!("done.");
        Ok(report)
    }

    pub fn avatar_filename(&self, email: &str) -> String {
        self.settings.avatar_filename_template.replace(EMAIL_PLACEHOLDER, email)
    }

    fn fetch_delay(&self) -> Duration {
        let delta = self.settings.les_fetch_delay_random_delta_ms;
        let jitter = if delta > 0 { rand::rng().random_range(0..delta) } else { 0 };
        Duration::from_millis(self.settings.les_fetch_delay_ms + jitter)
    }
}
