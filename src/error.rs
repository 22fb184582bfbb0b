//! Umbrella error for session-level operations.

use std::path::PathBuf;

use crate::auth::AuthError;
use crate::bootstrap::DecodeError;
use crate::envelope::EnvelopeError;
use crate::service::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("failed to construct HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("cache directory {dir:?} could not be created: {source}")]
    Cache {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
