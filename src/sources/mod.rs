/// Sources module
///
/// Login endpoints a `TokenCache` can refresh from.

use chrono::Duration;

use crate::cache::error::AuthError;

pub mod password_login;
pub mod service_account;

pub use password_login::PasswordLoginSource;
pub use service_account::ServiceAccountSource;

/// Token value as returned by a login, before the cache stamps an expiry on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedToken {
    pub value: String,
    /// `None` when the endpoint does not report one.
    pub ttl: Option<Duration>,
}

pub trait TokenSource: Send + Sync {
    fn name(&self) -> &str;

    /// Perform one login request.
    fn fetch_token(&self) -> impl std::future::Future<Output = Result<FetchedToken, AuthError>> + Send;
}
