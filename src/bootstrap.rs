//! Bootstrap-token decoding.
//!
//! A bootstrap token is the long-lived credential handed out by the service:
//! a URL-safe base64 string wrapping a JSON object with the app id (`id`),
//! the OAuth refresh token (`rt`), and the local decryption passphrase
//! (`dk`). Decoding is pure - no network or disk access.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use serde::Deserialize;

/// Failure to decode a bootstrap token.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("bootstrap token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Covers both non-JSON payloads and missing or wrong-typed fields;
    /// serde's message names the offending field.
    #[error("bootstrap token payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Wire shape of the decoded token payload.
#[derive(Deserialize)]
struct RawIdentity {
    id: u64,
    rt: String,
    dk: String,
}

/// Identity material decoded from a bootstrap token.
///
/// Immutable once decoded; the refresh token and decryption passphrase are
/// held as [`SecretString`] so they stay out of Debug output.
#[derive(Debug)]
pub struct BootstrapIdentity {
    pub app_id: u64,
    pub refresh_token: SecretString,
    pub decryption_key: SecretString,
}

impl BootstrapIdentity {
    /// Decode a bootstrap token string.
    ///
    /// The token uses a URL-safe alphabet (`-` for `+`, `_` for `/`); the
    /// substitution is undone before standard base64 decoding.
    pub fn decode(token: &str) -> Result<Self, DecodeError> {
        let normalized: String = token
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                c => c,
            })
            .collect();

        let payload = STANDARD.decode(normalized)?;
        let raw: RawIdentity = serde_json::from_slice(&payload)?;

        Ok(Self {
            app_id: raw.id,
            refresh_token: raw.rt.into(),
            decryption_key: raw.dk.into(),
        })
    }
}
