//! Locating and opening the destination conversation.

use courier_browser::UiDriver;
use courier_types::LocatorConfig;
use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostics;
use crate::error::DeliveryError;
use crate::poll::poll_until;
use crate::selectors::SelectorBook;

/// Opens the conversation matching a display label and leaves its compose
/// control present.
pub struct ConversationLocator<'a, U: UiDriver> {
    ui: &'a U,
    selectors: &'a SelectorBook,
    config: &'a LocatorConfig,
    diagnostics: &'a Diagnostics,
}

impl<'a, U: UiDriver> ConversationLocator<'a, U> {
    pub fn new(
        ui: &'a U,
        selectors: &'a SelectorBook,
        config: &'a LocatorConfig,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            ui,
            selectors,
            config,
            diagnostics,
        }
    }

    /// Find the conversation labeled `label` and open it.
    pub async fn open(&self, label: &str) -> Result<(), DeliveryError> {
        info!(label, "searching for conversation");
        self.dismiss_popups().await?;

        let search = self.locate_search_input().await?;
        let search = match search {
            Some(sel) => sel,
            None => {
                self.diagnostics.screenshot(self.ui, "no_search_box").await;
                return Err(DeliveryError::ConversationNotOpened {
                    label: label.to_string(),
                    detail: "search input never appeared".to_string(),
                });
            }
        };

        self.ui.click_with_fallback(&search).await?;
        self.ui.type_text(label).await?;
        debug!(label, "typed label into search");
        tokio::time::sleep(self.config.results_settle()).await;

        self.click_result(label).await?;
        tokio::time::sleep(self.config.open_settle()).await;

        // The compose control existing is the only reliable proof the
        // conversation actually opened.
        let compose = self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.compose_box))
            .await?;
        match compose {
            Some(_) => {
                info!(label, "conversation opened");
                Ok(())
            }
            None => {
                self.diagnostics.screenshot(self.ui, "chat_not_opened").await;
                self.diagnostics.html_dump(self.ui, "chat_not_opened").await;
                Err(DeliveryError::ConversationNotOpened {
                    label: label.to_string(),
                    detail: "compose control absent after opening".to_string(),
                })
            }
        }
    }

    /// Click any overlay dismiss control that is currently visible. Bounded
    /// sweep; a popup that refuses to die is left for the selector hunts to
    /// cope with.
    async fn dismiss_popups(&self) -> Result<bool, DeliveryError> {
        let mut dismissed = false;
        for selector in &self.selectors.popup_dismiss {
            match self.ui.is_visible(selector).await {
                Ok(true) => {
                    if self.ui.click_with_fallback(selector).await.is_ok() {
                        debug!(selector, "dismissed blocking overlay");
                        dismissed = true;
                        tokio::time::sleep(self.config.popup_settle()).await;
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    debug!(selector, error = %err, "popup probe failed");
                }
            }
        }
        Ok(dismissed)
    }

    /// Hunt for the search input: ordered candidates, then placeholder-text
    /// fallbacks, then clicking a search icon to reveal the input and
    /// letting the next poll find it.
    async fn locate_search_input(&self) -> Result<Option<String>, DeliveryError> {
        let mut polls = 0u32;
        let outcome = poll_until(
            self.config.search_poll_interval(),
            self.config.search_timeout(),
            || {
                polls += 1;
                let sweep_popups = polls % 10 == 0;
                async move {
                    if sweep_popups {
                        self.dismiss_popups().await?;
                    }

                    if let Some(sel) = self
                        .ui
                        .find_first_visible(&SelectorBook::as_refs(&self.selectors.search_inputs))
                        .await?
                    {
                        return Ok(Some(sel));
                    }
                    if let Some(sel) = self
                        .ui
                        .find_first_visible(&SelectorBook::as_refs(
                            &self.selectors.search_placeholder_fallback,
                        ))
                        .await?
                    {
                        debug!(selector = %sel, "search input found via placeholder fallback");
                        return Ok(Some(sel));
                    }

                    // Reveal attempt: some layouts hide the input behind an
                    // icon until clicked.
                    if let Some(icon) = self
                        .ui
                        .find_first_visible(&SelectorBook::as_refs(&self.selectors.search_icons))
                        .await?
                    {
                        debug!(selector = %icon, "clicking search icon to reveal input");
                        let _ = self.ui.click_with_fallback(&icon).await;
                    }
                    Ok::<_, DeliveryError>(None)
                }
            },
        )
        .await?;

        Ok(outcome.completed())
    }

    /// Click the search result: exact label match first, then the generic
    /// first result row, then Enter as a last resort.
    async fn click_result(&self, label: &str) -> Result<(), DeliveryError> {
        let exact = self.selectors.exact_chat_result(label);
        if self.ui.is_visible(&exact).await.unwrap_or(false) {
            match self.ui.click_with_fallback(&exact).await {
                Ok(()) => {
                    debug!(label, "clicked exact-label result");
                    return Ok(());
                }
                Err(err) => {
                    debug!(label, error = %err, "exact-label result unclickable, trying next");
                }
            }
        }

        if let Some(generic) = self
            .ui
            .find_first_visible(&SelectorBook::as_refs(&self.selectors.chat_results))
            .await?
        {
            self.ui.click_with_fallback(&generic).await?;
            debug!(selector = %generic, "clicked first generic result");
            return Ok(());
        }

        warn!(label, "no clickable result, pressing Enter");
        self.ui.press_enter().await?;
        Ok(())
    }
}
