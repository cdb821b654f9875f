use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::cache::error::AuthError;
use crate::cache::token::Token;
use crate::helpers::time::{Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::sources::TokenSource;

/// Used when the login response carries no TTL.
pub const FALLBACK_TTL_MINUTES: i64 = 50;

/// Single-token cache in front of one login endpoint.
///
/// Readers take the published token without touching the refresh lock.
/// When the token is absent or expired, callers queue on `refresh`, and the
/// first one through performs the login; the rest re-check and reuse it.
pub struct TokenCache<S> {
    source: S,
    fallback_ttl: Duration,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<Token>>,
    refresh: Mutex<()>,
}

impl<S: TokenSource> TokenCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            fallback_ttl: Duration::minutes(FALLBACK_TTL_MINUTES),
            clock,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn fallback_ttl(mut self, ttl: Duration) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return a valid bearer token, logging in first if needed.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        if let Some(value) = self.valid_token().await {
            return Ok(value);
        }

        let _guard = self.refresh.lock().await;

        // another caller may have refreshed while we were queued
        if let Some(value) = self.valid_token().await {
            debug!(source = self.source.name(), "token refreshed by a concurrent caller");
            return Ok(value);
        }

        let token = self.refresh_token().await?;
        let value = token.value.clone();
        *self.current.write().await = Some(token);
        Ok(value)
    }

    /// Snapshot of the cached token, valid or not.
    pub async fn cached(&self) -> Option<Token> {
        self.current.read().await.clone()
    }

    async fn valid_token(&self) -> Option<String> {
        let now = self.clock.now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now))
            .map(|token| token.value.clone())
    }

    async fn refresh_token(&self) -> Result<Token, AuthError> {
        let metrics = get_metrics().await;
        let name = self.source.name();
        info!(source = name, "refreshing token");

        let token = self.source.fetch_token().await.and_then(|fetched| {
            let ttl = fetched.ttl.unwrap_or(self.fallback_ttl);
            let expires_at = self.clock.now().checked_add_signed(ttl).ok_or_else(|| {
                AuthError::Authentication(format!("token lifetime {} is out of range", ttl))
            })?;
            Ok(Token::new(fetched.value, expires_at))
        });

        match &token {
            Ok(token) => {
                metrics.token_refreshes.with_label_values(&[name]).inc();
                debug!(source = name, expires_at = %token.expires_at, "token refreshed");
            }
            Err(err) => {
                error!(source = name, error = %err, "token refresh failed");
                metrics
                    .token_refresh_failures
                    .with_label_values(&[name, err.kind()])
                    .inc();
            }
        }
        token
    }
}
