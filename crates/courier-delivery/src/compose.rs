//! Caption typing and send-control clicking.

use courier_browser::{UiDriver, UiError};
use courier_types::SendConfig;
use tracing::{debug, info, warn};

use crate::cascade::{run_cascade, Strategy};
use crate::diagnostics::Diagnostics;
use crate::error::DeliveryError;
use crate::poll::poll_until;
use crate::selectors::SelectorBook;

pub struct SendController<'a, U: UiDriver> {
    ui: &'a U,
    selectors: &'a SelectorBook,
    config: &'a SendConfig,
    diagnostics: &'a Diagnostics,
}

impl<'a, U: UiDriver> SendController<'a, U> {
    pub fn new(
        ui: &'a U,
        selectors: &'a SelectorBook,
        config: &'a SendConfig,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            ui,
            selectors,
            config,
            diagnostics,
        }
    }

    /// Type the caption under the upload preview. Best-effort: a report
    /// without a caption is still worth sending, so failure here degrades to
    /// a warning instead of aborting.
    ///
    /// Returns whether a caption actually went in.
    pub async fn type_caption(&self, caption: &str) -> Result<bool, DeliveryError> {
        let typed = match self.try_type_caption(caption).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "could not type caption, sending without one");
                false
            }
        };
        tokio::time::sleep(self.config.caption_settle()).await;
        Ok(typed)
    }

    async fn try_type_caption(&self, caption: &str) -> Result<(), UiError> {
        match self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.caption_inputs))
            .await?
        {
            Some(input) => {
                self.ui.click_with_fallback(&input).await?;
                self.ui.type_text(caption).await?;
                debug!(selector = %input, "caption typed into input");
            }
            None => {
                // The preview usually focuses its caption field by itself;
                // type into whatever has focus.
                self.ui.type_text(caption).await?;
                debug!("caption typed into focused element");
            }
        }
        Ok(())
    }

    /// Find the send control and click it through the full cascade.
    pub async fn send(&self) -> Result<(), DeliveryError> {
        let send_button = self.find_send_control().await?;

        let ui = self.ui;
        let sel = send_button.as_str();
        run_cascade(vec![
            Strategy::new("click", || ui.click(sel)),
            Strategy::new("forced-click", || ui.click_forced(sel)),
            Strategy::new("js-click", || ui.click_js(sel)),
            Strategy::new("enter-key", || ui.press_enter()),
        ])
        .await
        .map_err(|exhausted| DeliveryError::SendClickFailed {
            detail: exhausted.to_string(),
        })?;

        info!("send control clicked");
        Ok(())
    }

    async fn find_send_control(&self) -> Result<String, DeliveryError> {
        let outcome = poll_until(
            self.config.control_poll_interval(),
            self.config.control_timeout(),
            || async {
                Ok::<_, DeliveryError>(
                    self.ui
                        .find_first_visible(&SelectorBook::as_refs(&self.selectors.send_buttons))
                        .await?,
                )
            },
        )
        .await?;

        match outcome.completed() {
            Some(sel) => {
                debug!(selector = %sel, "send control found");
                Ok(sel)
            }
            None => {
                self.diagnostics.screenshot(self.ui, "no_send_button").await;
                Err(DeliveryError::SendControlNotFound {
                    waited: self.config.control_timeout(),
                })
            }
        }
    }
}
