pub mod auth;
pub mod bootstrap;
pub mod cache;
pub mod clock;
pub mod config;
pub mod envelope;
pub mod error;
pub mod service;
pub mod session;

pub use bootstrap::{BootstrapIdentity, DecodeError};
pub use cache::{CacheConfig, CachedToken, TokenCache};
pub use config::ClientConfig;
pub use envelope::{EnvelopeError, SecretEnvelope};
pub use error::Error;
pub use session::CredentialSession;
