//! On-disk cache for the short-lived access token.
//!
//! The cache is a single JSON file, `<dir>/access_token`, replaced wholesale
//! on every refresh. Reads treat a missing or malformed file as a miss.
//! Writes go to a temp file in the cache directory and are renamed into
//! place, so concurrent writers are last-write-wins rather than a source of
//! truncated reads. There is no cross-process locking.

use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

const CACHE_FILE_NAME: &str = "access_token";

/// Where (and whether) refreshed access tokens are cached.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl CacheConfig {
    pub fn enabled(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }
}

/// A refreshed access token with its expiry, as stored in the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    /// Unix timestamp after which the token is unusable.
    pub expires_at: i64,
}

/// Reads and writes the cached access token.
pub struct TokenCache {
    config: CacheConfig,
}

impl TokenCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    fn cache_file(&self) -> PathBuf {
        self.config.dir.join(CACHE_FILE_NAME)
    }

    /// Read the cached token.
    ///
    /// Any failure - no file, unreadable, unparseable - is a miss, never an
    /// error; a miss simply sends the caller through the refresh exchange.
    pub fn read(&self) -> Option<CachedToken> {
        if !self.config.enabled {
            return None;
        }

        let path = self.cache_file();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %path.display(), %err, "token cache miss");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(err) => {
                debug!(path = %path.display(), %err, "ignoring unparseable token cache");
                None
            }
        }
    }

    /// Write the token, replacing any previous cache contents.
    pub fn write(&self, token: &CachedToken) -> std::io::Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let content = serde_json::to_string(token)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.config.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(self.cache_file()).map_err(|err| err.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> CachedToken {
        CachedToken {
            access_token: "at-abc123".to_string(),
            expires_at: 1_900_000_000,
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(CacheConfig::enabled(dir.path()));

        cache.write(&token()).unwrap();
        assert_eq!(cache.read(), Some(token()));
    }

    #[test]
    fn write_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(CacheConfig::enabled(dir.path()));

        cache.write(&token()).unwrap();
        let newer = CachedToken {
            access_token: "at-def456".to_string(),
            expires_at: 2_000_000_000,
        };
        cache.write(&newer).unwrap();
        assert_eq!(cache.read(), Some(newer));
    }

    #[test]
    fn missing_file_reads_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(CacheConfig::enabled(dir.path()));
        assert_eq!(cache.read(), None);
    }

    #[test]
    fn unparseable_file_reads_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE_NAME), "{ not json").unwrap();

        let cache = TokenCache::new(CacheConfig::enabled(dir.path()));
        assert_eq!(cache.read(), None);
    }

    #[test]
    fn disabled_cache_is_a_no_op() {
        let cache = TokenCache::new(CacheConfig::disabled());
        cache.write(&token()).unwrap();
        assert_eq!(cache.read(), None);
    }

    #[test]
    fn cache_file_uses_wire_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(CacheConfig::enabled(dir.path()));
        cache.write(&token()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(CACHE_FILE_NAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["access_token"], "at-abc123");
        assert_eq!(value["expires_at"], 1_900_000_000i64);
    }
}
