//! Session establishment against the messaging client.
//!
//! Drives the page from its entry URL to a usable inbox. The only
//! deliberately unbounded wait in the whole pipeline lives here: an
//! authentication-pending indicator means a human has to scan a code, and no
//! timeout makes that happen faster.

use std::time::Duration;

use courier_browser::UiDriver;
use courier_types::SessionConfig;
use tracing::{info, warn};

use crate::diagnostics::Diagnostics;
use crate::error::DeliveryError;
use crate::selectors::SelectorBook;

/// Observable states of session establishment.
///
/// `Ready` and `TimedOut` are terminal. `AwaitingAuthentication` may persist
/// indefinitely and is not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    AwaitingAuthentication,
    Ready,
    TimedOut,
}

/// Take a screenshot every this many readiness polls.
const SCREENSHOT_EVERY_POLLS: u32 = 8;

/// Establishes a ready session on an already-navigable page.
pub struct SessionManager<'a, U: UiDriver> {
    ui: &'a U,
    selectors: &'a SelectorBook,
    config: &'a SessionConfig,
    diagnostics: &'a Diagnostics,
}

impl<'a, U: UiDriver> SessionManager<'a, U> {
    pub fn new(
        ui: &'a U,
        selectors: &'a SelectorBook,
        config: &'a SessionConfig,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            ui,
            selectors,
            config,
            diagnostics,
        }
    }

    /// Navigate to the entry URL and poll until the inbox UI is rendered.
    ///
    /// A ready landmark must be observed on `required_ready_polls`
    /// consecutive polls before `Ready` is declared; landmarks that flicker
    /// in and out during load reset the counter. An authentication-pending
    /// indicator pauses the deadline: the wait for the scan is unbounded,
    /// and the load budget restarts once the indicator clears.
    pub async fn establish(&self, entry_url: &str) -> Result<SessionState, DeliveryError> {
        info!(url = entry_url, "navigating to messaging client");
        self.ui.navigate(entry_url).await?;

        let mut state = SessionState::Loading;
        let mut consecutive_ready = 0u32;
        let mut polls = 0u32;
        let mut deadline = tokio::time::Instant::now() + self.config.load_timeout();

        loop {
            polls += 1;
            if polls % SCREENSHOT_EVERY_POLLS == 0 {
                self.diagnostics.screenshot(self.ui, "session_loading").await;
            }

            if self.auth_pending().await? {
                if state != SessionState::AwaitingAuthentication {
                    state = SessionState::AwaitingAuthentication;
                    warn!("authentication code displayed; waiting for a device scan");
                    self.diagnostics.screenshot(self.ui, "auth_code").await;
                }
                self.wait_for_authentication().await?;
                info!("authentication code cleared, resuming load wait");
                state = SessionState::Loading;
                consecutive_ready = 0;
                deadline = tokio::time::Instant::now() + self.config.load_timeout();
                continue;
            }

            let landmark = self
                .ui
                .find_first_visible(&SelectorBook::as_refs(&self.selectors.ready_landmarks))
                .await?;

            match landmark {
                Some(selector) => {
                    consecutive_ready += 1;
                    tracing::debug!(
                        selector,
                        consecutive = consecutive_ready,
                        required = self.config.required_ready_polls,
                        "ready landmark observed"
                    );
                    if consecutive_ready >= self.config.required_ready_polls {
                        info!("messaging client is ready");
                        return Ok(SessionState::Ready);
                    }
                }
                None => {
                    // A flicker resets the streak entirely.
                    consecutive_ready = 0;
                }
            }

            if tokio::time::Instant::now() >= deadline {
                self.diagnostics.screenshot(self.ui, "session_timeout").await;
                self.diagnostics.html_dump(self.ui, "session_timeout").await;
                return Err(DeliveryError::SessionLoadTimeout {
                    waited: self.config.load_timeout(),
                });
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    async fn auth_pending(&self) -> Result<bool, DeliveryError> {
        Ok(self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.auth_pending))
            .await?
            .is_some())
    }

    /// Block until every authentication-pending indicator is gone. This wait
    /// has no bound by design.
    async fn wait_for_authentication(&self) -> Result<(), DeliveryError> {
        let interval: Duration = self.config.auth_poll_interval();
        loop {
            if !self.auth_pending().await? {
                return Ok(());
            }
            tokio::time::sleep(interval).await;
        }
    }
}
