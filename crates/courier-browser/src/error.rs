//! Error types for the courier-browser crate.

use std::time::Duration;

use thiserror::Error;

/// Errors from the low-level CDP transport and protocol layer.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to establish a WebSocket connection to the DevTools endpoint.
    #[error("failed to connect to DevTools at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// A CDP command returned an error response.
    #[error("CDP error {code}: {message}")]
    Command {
        code: i64,
        message: String,
        data: Option<String>,
    },

    /// A CDP command timed out waiting for a response.
    #[error("CDP command '{method}' timed out after {duration:?}")]
    Timeout { method: String, duration: Duration },

    /// Serialization or unexpected-message-shape failure.
    #[error("CDP protocol error: {detail}")]
    Protocol { detail: String },
}

/// Errors from browser discovery and process launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no Chrome or Chromium binary found on this system")]
    NoChromeFound,

    #[error("failed to spawn browser process `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("DevTools endpoint on port {port} did not come up within {duration:?}")]
    DevtoolsUnreachable { port: u16, duration: Duration },

    #[error("DevTools reported no page target on port {port}")]
    NoPageTarget { port: u16 },

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

/// Errors surfaced through the [`UiDriver`](crate::ui::UiDriver) seam.
///
/// Delivery code programs against this type only, so a fake driver in tests
/// never needs to fabricate transport-level errors.
#[derive(Debug, Error)]
pub enum UiError {
    /// The requested element was not present in the page.
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// The element exists but could not be interacted with.
    #[error("element not interactable ({selector}): {reason}")]
    NotInteractable { selector: String, reason: String },

    /// JavaScript evaluation raised in the page.
    #[error("script exception: {message}")]
    ScriptException { message: String },

    /// Navigation failed at the browser level.
    #[error("navigation failed: {reason}")]
    NavigationFailed { reason: String },

    /// The intercepted native file chooser never opened.
    #[error("file chooser did not open within {duration:?}")]
    FileChooserTimeout { duration: Duration },

    /// Anything from the underlying transport.
    #[error("browser backend error: {0}")]
    Backend(String),
}

impl From<CdpError> for UiError {
    fn from(err: CdpError) -> Self {
        UiError::Backend(err.to_string())
    }
}
