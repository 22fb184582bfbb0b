//! Client configuration.
//!
//! All ambient state - home directory, environment variables - is resolved
//! before a session is constructed; the core only sees the explicit values
//! carried here. Configuration can be loaded from a TOML file or built with
//! the `with_*` methods.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

fn default_api_host() -> String {
    "https://api.keystok.com".to_string()
}

fn default_auth_host() -> String {
    "https://keystok.com".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Configuration consumed by [`CredentialSession`](crate::CredentialSession).
///
/// # Example
///
/// ```toml
/// api_host = "https://api.keystok.com"
/// auth_host = "https://keystok.com"
/// cache_dir = "/var/cache/keystok"
/// use_cache = true
/// timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for the secret-service API.
    pub api_host: String,

    /// Base URL for the authorization endpoint.
    pub auth_host: String,

    /// Token cache directory. `None` falls back to [`default_cache_dir`].
    pub cache_dir: Option<PathBuf>,

    /// Set to false to skip the on-disk token cache entirely.
    pub use_cache: bool,

    /// Per-request timeout applied to every network call.
    #[serde(deserialize_with = "deserialize_timeout")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            auth_host: default_auth_host(),
            cache_dir: None,
            use_cache: true,
            timeout: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = trim_host(host.into());
        self
    }

    pub fn with_auth_host(mut self, host: impl Into<String>) -> Self {
        self.auth_host = trim_host(host.into());
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn trim_host(host: String) -> String {
    host.trim_end_matches('/').to_string()
}

/// Conventional default cache directory (`~/.keystok`).
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".keystok"))
}

/// Parse a timeout string like "30s", "5m", "1h".
fn parse_timeout(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let (num, multiplier) = if let Some(num) = s.strip_suffix('h') {
        (num, 60 * 60)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1)
    } else {
        anyhow::bail!("Timeout must end with h, m, or s");
    };

    let num: u64 = num.parse().context("Invalid number in timeout")?;
    let secs = num.checked_mul(multiplier).context("Timeout is too large")?;
    Ok(Duration::from_secs(secs))
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_timeout(&s).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_point_at_production_hosts() {
        let config = ClientConfig::default();
        assert_eq!(config.api_host, "https://api.keystok.com");
        assert_eq!(config.auth_host, "https://keystok.com");
        assert!(config.use_cache);
        assert_eq!(config.cache_dir, None);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn builders_override_fields() {
        let config = ClientConfig::default()
            .with_api_host("http://localhost:8080/")
            .with_auth_host("http://localhost:8081")
            .with_cache_dir("/tmp/keystok-test")
            .without_cache()
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.api_host, "http://localhost:8080");
        assert_eq!(config.auth_host, "http://localhost:8081");
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/keystok-test")));
        assert!(!config.use_cache);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn loads_from_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
api_host = "https://api.example.test"
use_cache = false
timeout = "2m"
"#
        )?;

        let config = ClientConfig::load(file.path())?;
        assert_eq!(config.api_host, "https://api.example.test");
        assert_eq!(config.auth_host, "https://keystok.com");
        assert!(!config.use_cache);
        assert_eq!(config.timeout, Duration::from_secs(120));

        Ok(())
    }

    #[test]
    fn parse_timeout_units() {
        assert_eq!(parse_timeout("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_timeout("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_timeout("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_timeout(" 10S ").unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn parse_timeout_rejects_garbage() {
        assert!(parse_timeout("30").is_err());
        assert!(parse_timeout("fast").is_err());
        assert!(parse_timeout("").is_err());
        assert!(parse_timeout("-1s").is_err());
    }
}
