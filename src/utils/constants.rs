//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_CONFIG_PATH: &str = "avatar-sync.yaml";

/// Upper bound for a configured fallback token lifetime.
pub const MAX_FALLBACK_TTL_SECONDS: u64 = 24 * 60 * 60;

pub const DEFAULT_EMAIL_PATTERN: &str = r"^[a-z]+\.[a-z]+@leverx\.com$";
pub const EMAIL_PLACEHOLDER: &str = "{{email}}";

/// Image url recorded for users in dry run mode.
pub const DRY_RUN_IMAGE_URL: &str = "https://DRY_RUN.com";
