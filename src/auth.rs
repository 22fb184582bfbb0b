//! Access-token resolution.
//!
//! A session resolves its access token at most once: an already-resolved
//! in-memory token is always reused (even past its expiry), then an
//! unexpired cached token, and only then the OAuth-style refresh exchange
//! against the auth host. Refresh failures propagate to the caller; retry
//! policy belongs to the caller.

use std::sync::{Arc, Mutex};

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::bootstrap::BootstrapIdentity;
use crate::cache::{CachedToken, TokenCache};
use crate::clock::{Clock, SystemClock};

/// Failure of the refresh exchange.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token refresh request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("token refresh request to {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("token refresh response from {endpoint} was malformed: {reason}")]
    MalformedResponse { endpoint: String, reason: String },
}

/// Wire shape of the refresh response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    /// Lifetime of the new token, in seconds.
    expires_in: i64,
}

/// Client for the authorization endpoint.
pub struct AuthClient {
    client: reqwest::Client,
    auth_host: String,
    cache: TokenCache,
    clock: Arc<dyn Clock>,
    /// Resolved once per session; reused by every later call. Intended for
    /// single-session use - callers sharing one client across threads get
    /// whichever token resolves first.
    session_token: Mutex<Option<String>>,
}

impl AuthClient {
    pub fn new(client: reqwest::Client, auth_host: impl Into<String>, cache: TokenCache) -> Self {
        Self::with_clock(client, auth_host, cache, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: reqwest::Client,
        auth_host: impl Into<String>,
        cache: TokenCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            auth_host: auth_host.into(),
            cache,
            clock,
            session_token: Mutex::new(None),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/oauth/token", self.auth_host)
    }

    /// Resolve a usable access token for this session.
    pub async fn resolve_access_token(
        &self,
        identity: &BootstrapIdentity,
    ) -> Result<String, AuthError> {
        if let Some(token) = self.session_token().clone() {
            return Ok(token);
        }

        if let Some(cached) = self.cache.read() {
            if cached.expires_at > self.clock.epoch_seconds() {
                debug!("using cached access token");
                *self.session_token() = Some(cached.access_token.clone());
                return Ok(cached.access_token);
            }
            debug!("cached access token expired, refreshing");
        }

        self.refresh(identity).await
    }

    async fn refresh(&self, identity: &BootstrapIdentity) -> Result<String, AuthError> {
        let endpoint = self.endpoint();
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", identity.refresh_token.expose_secret()),
        ];

        let response = self
            .client
            .post(&endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|source| AuthError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                endpoint,
                status,
                body,
            });
        }

        let body = response.text().await.map_err(|source| AuthError::Http {
            endpoint: endpoint.clone(),
            source,
        })?;
        let refresh: RefreshResponse =
            serde_json::from_str(&body).map_err(|err| AuthError::MalformedResponse {
                endpoint: endpoint.clone(),
                reason: err.to_string(),
            })?;
        if refresh.access_token.is_empty() {
            return Err(AuthError::MalformedResponse {
                endpoint,
                reason: "empty access_token".to_string(),
            });
        }

        let cached = CachedToken {
            access_token: refresh.access_token,
            expires_at: self.clock.epoch_seconds() + refresh.expires_in,
        };
        // Cache persistence is best-effort; the in-memory token carries the
        // session either way.
        if let Err(err) = self.cache.write(&cached) {
            warn!(%err, "failed to persist refreshed access token");
        }

        *self.session_token() = Some(cached.access_token.clone());
        Ok(cached.access_token)
    }

    fn session_token(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.session_token
            .lock()
            .expect("session token lock poisoned")
    }
}
