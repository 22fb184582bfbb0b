//! Session orchestration.
//!
//! A [`CredentialSession`] decodes the bootstrap token once at construction,
//! prepares the token cache, and exposes the two public operations: list
//! secret metadata and fetch one decrypted secret.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::auth::AuthClient;
use crate::bootstrap::BootstrapIdentity;
use crate::cache::{CacheConfig, TokenCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{default_cache_dir, ClientConfig};
use crate::error::Error;
use crate::service::SecretServiceClient;

pub struct CredentialSession {
    identity: BootstrapIdentity,
    service: SecretServiceClient,
}

impl CredentialSession {
    /// Construct a session from a raw bootstrap token.
    ///
    /// The cache directory is created if absent. When the caller explicitly
    /// configured a directory, failure to create it is fatal; with the
    /// default location, caching is disabled with a warning instead.
    pub fn new(bootstrap_token: &str, config: ClientConfig) -> Result<Self, Error> {
        Self::with_clock(bootstrap_token, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        bootstrap_token: &str,
        config: ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let identity = BootstrapIdentity::decode(bootstrap_token)?;
        let cache_config = prepare_cache(&config)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::Client)?;

        let auth = AuthClient::with_clock(
            client.clone(),
            config.auth_host.clone(),
            TokenCache::new(cache_config),
            clock,
        );
        let service = SecretServiceClient::new(client, config.api_host, auth);

        Ok(Self { identity, service })
    }

    pub fn app_id(&self) -> u64 {
        self.identity.app_id
    }

    /// List secret ids with their descriptions.
    pub async fn list_secrets(&self) -> Result<HashMap<String, String>, Error> {
        self.service.list_secrets(&self.identity).await
    }

    /// Fetch one secret and decrypt it.
    pub async fn get_secret(&self, secret_id: &str) -> Result<String, Error> {
        self.service.get_secret(&self.identity, secret_id).await
    }
}

fn prepare_cache(config: &ClientConfig) -> Result<CacheConfig, Error> {
    if !config.use_cache {
        return Ok(CacheConfig::disabled());
    }

    let explicit = config.cache_dir.is_some();
    let Some(dir) = config.cache_dir.clone().or_else(default_cache_dir) else {
        warn!("no home directory found, disabling the token cache");
        return Ok(CacheConfig::disabled());
    };

    match std::fs::create_dir_all(&dir) {
        Ok(()) => Ok(CacheConfig::enabled(dir)),
        Err(source) if explicit => Err(Error::Cache { dir, source }),
        Err(err) => {
            warn!(dir = %dir.display(), %err, "could not create cache directory, disabling the token cache");
            Ok(CacheConfig::disabled())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str =
        "eyJpZCI6NDI0MiwicnQiOiJydC0wMTIzNDU2Nzg5YWJjZGVmIiwiZGsiOiJjb3JyZWN0IGhvcnNlIGJhdHRlcnkgc3RhcGxlIn0=";

    #[test]
    fn construction_decodes_identity() {
        let dir = tempfile::tempdir().unwrap();
        let session = CredentialSession::new(
            TOKEN,
            ClientConfig::default().with_cache_dir(dir.path()),
        )
        .unwrap();
        assert_eq!(session.app_id(), 4242);
    }

    #[test]
    fn construction_rejects_bad_token() {
        let result = CredentialSession::new("not a token", ClientConfig::default().without_cache());
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn construction_creates_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cache").join("keystok");
        CredentialSession::new(TOKEN, ClientConfig::default().with_cache_dir(&nested)).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn explicit_unusable_cache_dir_is_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A path through a regular file cannot be created as a directory.
        let dir = file.path().join("nested");
        let result = CredentialSession::new(TOKEN, ClientConfig::default().with_cache_dir(dir));
        assert!(matches!(result, Err(Error::Cache { .. })));
    }
}
