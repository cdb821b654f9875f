use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::clients::UserProfile;
use crate::observability::metrics::get_metrics;
use crate::sync::{AvatarSource, AvatarSync, ConfirmationPolicy, Decision, IdentityStore, ProfileStore};

const WORKFLOW: &str = "validate_emails";
pub const START_FIXING_PROMPT: &str = "Start fixing process? (y/n)";
pub const SKIP_FIREBASE_FAILURE_PROMPT: &str = "Skip? (y/n/a)";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidateEmailsReport {
    pub checked: usize,
    pub broken: usize,
    pub fix_started: bool,
    pub fixed: usize,
    pub skipped: usize,
    pub aborted: bool,
}

impl<P, A, I> AvatarSync<P, A, I>
where
    P: ProfileStore,
    A: AvatarSource,
    I: IdentityStore,
{
    /// Report BaseData profiles whose email is missing or off-pattern and,
    /// once confirmed, replace it with the email Firebase has for the same id.
    pub async fn validate_emails<C: ConfirmationPolicy>(&self, policy: &mut C) -> Result<ValidateEmailsReport> {
        let metrics = get_metrics().await;
        let mut report = ValidateEmailsReport::default();

        info!("fetching all users from BaseData...");
        let users = self.profiles.get_all_users().await?;
        report.checked = users.len();
        info!("fetched {} users", users.len());

        let broken: Vec<UserProfile> = users.into_iter().filter(|user| !self.has_valid_email(user)).collect();
        report.broken = broken.len();
        info!("found {} problems", broken.len());

        if !policy.confirm(START_FIXING_PROMPT).is_yes() {
            return Ok(report);
        }
        report.fix_started = true;

        let mut skip_failures = false;
        for mut user in broken {
            let Some(id) = user.id.clone() else {
                warn!("found user without id field, skipping...");
                report.skipped += 1;
                continue;
            };

            let record = match self.identity.get_user(&id).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(id = %id, "failed to find user in firebase: {}", e);
                    report.skipped += 1;
                    if skip_failures {
                        continue;
                    }
                    match policy.confirm(SKIP_FIREBASE_FAILURE_PROMPT) {
                        Decision::All => skip_failures = true,
                        Decision::Yes => {}
                        Decision::No => {
                            report.aborted = true;
                            metrics.workflow_runs.with_label_values(&[WORKFLOW, "aborted"]).inc();
                            return Ok(report);
                        }
                    }
                    continue;
                }
            };

            let Some(firebase_email) = record.email.filter(|email| !email.is_empty()) else {
                warn!(uid = %record.uid, "can't fix user: firebase email is empty");
                report.skipped += 1;
                continue;
            };

            let old_email = user.email.replace(firebase_email).unwrap_or_default();
            if !self.settings.dry_run {
                self.profiles.update_user(&user).await?;
            }
            info!("fixed user email: '{}' -> '{}'", old_email, user.email_or_empty());
            report.fixed += 1;
            metrics.workflow_items.with_label_values(&[WORKFLOW, "fixed"]).inc();
        }

        metrics.workflow_runs.with_label_values(&[WORKFLOW, "done"]).inc();
        Ok(report)
    }

    pub fn has_valid_email(&self, user: &UserProfile) -> bool {
        match user.email.as_deref() {
            None => {
                error!("PROBLEM: user without email field, id: {}", user.id.as_deref().unwrap_or_default());
                false
            }
            Some(email) if self.settings.email_pattern.is_match(email) => {
                debug!("passed: {}", email);
                true
            }
            Some(email) => {
                error!("PROBLEM: {}", email);
                false
            }
        }
    }
}
