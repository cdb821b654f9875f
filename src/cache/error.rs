use thiserror::Error;

/// Failures of a token refresh. Nothing is retried; the caller decides.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential missing from the secret store or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Login endpoint rejected the request or answered with something unparsable.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "configuration",
            AuthError::Authentication(_) => "authentication",
            AuthError::Network(_) => "network",
        }
    }
}
