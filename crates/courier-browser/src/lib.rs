//! CDP browser driver for the courier delivery engine.
//!
//! Three layers:
//!
//! - **`cdp`**: WebSocket client with JSON-RPC 2.0 command/response
//!   correlation and an event channel.
//! - **`driver`**: [`PageDriver`] with navigation, evaluation, visibility
//!   probes, the click variants, keyboard input, file-input injection,
//!   native file-chooser interception, and screenshots.
//! - **`ui`**: the [`UiDriver`] capability trait the delivery engine
//!   programs against, plus [`CdpUi`], its production implementation.
//!
//! `launch` discovers a Chrome/Chromium binary and spawns it headless with a
//! persistent profile directory and a DevTools port.
//!
//! ```ignore
//! use courier_browser::{BrowserSession, CdpUi, PageDriver};
//!
//! let session = BrowserSession::launch(None, profile_dir, 9222).await?;
//! let driver = PageDriver::connect(session.ws_url()).await?;
//! let ui = CdpUi::new(driver);
//! ```

pub mod cdp;
pub mod driver;
pub mod error;
pub mod launch;
pub mod ui;

pub use cdp::{CdpClient, CdpEvent};
pub use driver::{NodeId, PageDriver};
pub use error::{CdpError, LaunchError, UiError};
pub use launch::BrowserSession;
pub use ui::{CdpUi, UiDriver};
