//! Error taxonomy for one delivery attempt.
//!
//! Each pipeline stage either returns a successful result or raises exactly
//! one of these variants; the orchestrator propagates the first failure
//! unchanged. Fallback retries live inside the stages, never here.

use std::path::PathBuf;
use std::time::Duration;

use courier_browser::{LaunchError, UiError};
use thiserror::Error;

/// Artifact validation failures. All of these abort the attempt before a
/// browser is launched.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {path}")]
    NotFound { path: PathBuf },

    #[error("artifact is empty (0 bytes): {path}")]
    Empty { path: PathBuf },

    #[error("artifact too large ({size_bytes} bytes, limit {limit_bytes}): {path}")]
    TooLarge {
        path: PathBuf,
        size_bytes: u64,
        limit_bytes: u64,
    },

    #[error("artifact is not a PDF (bad signature): {path}")]
    InvalidFormat { path: PathBuf },

    #[error("artifact is encrypted; the client will reject it: {path}")]
    Encrypted { path: PathBuf },

    #[error("failed to read artifact `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors a delivery attempt can end with.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("messaging client did not reach ready state within {waited:?}")]
    SessionLoadTimeout { waited: Duration },

    #[error("conversation `{label}` did not open: {detail}")]
    ConversationNotOpened { label: String, detail: String },

    #[error("could not attach the artifact: {detail}")]
    AttachmentFailed { detail: String },

    #[error("send control not found within {waited:?}")]
    SendControlNotFound { waited: Duration },

    #[error("send control could not be clicked: {detail}")]
    SendClickFailed { detail: String },

    #[error("send verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error(transparent)]
    Browser(#[from] UiError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}
