//! Attaching the artifact to the open conversation.
//!
//! The attach affordance is resolved inside the compose footer only, so a
//! stray icon elsewhere on the page can never be clicked by mistake. File
//! injection runs as a strict priority cascade; the first strategy that
//! succeeds names the attempt.

use std::path::Path;

use courier_browser::{UiDriver, UiError};
use courier_types::AttachConfig;
use tracing::{debug, info};

use crate::cascade::{run_cascade, Strategy};
use crate::diagnostics::Diagnostics;
use crate::error::DeliveryError;
use crate::poll::poll_until;
use crate::selectors::SelectorBook;

/// How the artifact ended up attached.
///
/// Order here is documentation; the cascade in [`AttachmentPipeline::attach`]
/// is the binding priority: menu-driven chooser first, raw input second,
/// positional fallback last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStrategy {
    /// "Document" menu entry clicked, native file chooser intercepted.
    FileChooserViaMenu,
    /// File supplied straight to a raw non-image `<input type="file">`.
    DirectInput,
    /// Second menu item clicked blind, then chooser interception.
    MenuPositionFallback,
}

/// Outcome of a successful attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentResult {
    pub strategy_used: AttachStrategy,
}

pub struct AttachmentPipeline<'a, U: UiDriver> {
    ui: &'a U,
    selectors: &'a SelectorBook,
    config: &'a AttachConfig,
    diagnostics: &'a Diagnostics,
}

impl<'a, U: UiDriver> AttachmentPipeline<'a, U> {
    pub fn new(
        ui: &'a U,
        selectors: &'a SelectorBook,
        config: &'a AttachConfig,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            ui,
            selectors,
            config,
            diagnostics,
        }
    }

    /// Attach `artifact` to the open conversation.
    pub async fn attach(&self, artifact: &Path) -> Result<AttachmentResult, DeliveryError> {
        let attach_button = self.find_attach_button().await?;
        self.ui.click_with_fallback(&attach_button).await?;
        debug!(selector = %attach_button, "attach menu opened");
        tokio::time::sleep(self.config.menu_settle()).await;

        let hit = run_cascade(vec![
            Strategy::new("document-menu", || self.via_document_menu(artifact)),
            Strategy::new("direct-input", || self.via_direct_input(artifact)),
            Strategy::new("menu-position", || self.via_menu_position(artifact)),
        ])
        .await
        .map_err(|exhausted| DeliveryError::AttachmentFailed {
            detail: exhausted.to_string(),
        })?;

        info!(strategy = ?hit.value, "artifact attached");
        // Let the client render the upload preview before the caption step.
        tokio::time::sleep(self.config.upload_settle()).await;
        Ok(AttachmentResult {
            strategy_used: hit.value,
        })
    }

    /// Bounded hunt for the footer-scoped attach affordance.
    async fn find_attach_button(&self) -> Result<String, DeliveryError> {
        let outcome = poll_until(
            self.config.button_poll_interval(),
            self.config.button_timeout(),
            || async {
                Ok::<_, DeliveryError>(
                    self.ui
                        .find_first_visible(&SelectorBook::as_refs(&self.selectors.attach_buttons))
                        .await?,
                )
            },
        )
        .await?;

        match outcome.completed() {
            Some(sel) => Ok(sel),
            None => {
                self.diagnostics.screenshot(self.ui, "no_attach_button").await;
                Err(DeliveryError::AttachmentFailed {
                    detail: "attach affordance never appeared in the compose footer".to_string(),
                })
            }
        }
    }

    /// Preferred: the document-specific menu entry, with the native chooser
    /// intercepted and fed the artifact path.
    async fn via_document_menu(&self, artifact: &Path) -> Result<AttachStrategy, UiError> {
        let entry = self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.document_menu_items))
            .await?
            .ok_or_else(|| UiError::ElementNotFound {
                selector: "document menu entry".to_string(),
            })?;
        self.ui
            .click_expecting_file_chooser(&entry, artifact, self.config.chooser_timeout())
            .await?;
        Ok(AttachStrategy::FileChooserViaMenu)
    }

    /// Fallback: a raw file input not restricted to images, fed directly.
    async fn via_direct_input(&self, artifact: &Path) -> Result<AttachStrategy, UiError> {
        for selector in &self.selectors.file_inputs {
            if self.ui.count(selector).await.unwrap_or(0) > 0 {
                self.ui.set_file_input(selector, artifact).await?;
                return Ok(AttachStrategy::DirectInput);
            }
        }
        Err(UiError::ElementNotFound {
            selector: "raw file input".to_string(),
        })
    }

    /// Last resort: click the second menu item by position and hope it is
    /// the document entry.
    async fn via_menu_position(&self, artifact: &Path) -> Result<AttachStrategy, UiError> {
        let item = self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.menu_second_item))
            .await?
            .ok_or_else(|| UiError::ElementNotFound {
                selector: "second menu item".to_string(),
            })?;
        self.ui
            .click_expecting_file_chooser(&item, artifact, self.config.chooser_timeout())
            .await?;
        Ok(AttachStrategy::MenuPositionFallback)
    }
}
