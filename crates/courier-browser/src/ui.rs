//! The `UiDriver` capability seam.
//!
//! The delivery engine never talks CDP directly: it programs against this
//! trait, which exposes exactly the page capabilities the delivery flow
//! needs. Ordered selector-candidate scanning and the click fallback cascade
//! are provided methods, so every caller resolves unstable DOM identifiers
//! the same way. Tests supply a scripted fake; production wires in
//! [`CdpUi`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::PageDriver;
use crate::error::UiError;

/// Capabilities the delivery engine requires from a browser page.
#[async_trait]
pub trait UiDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), UiError>;

    /// Number of elements matching the selector.
    async fn count(&self, selector: &str) -> Result<usize, UiError>;

    /// Whether the first match is present and rendered.
    async fn is_visible(&self, selector: &str) -> Result<bool, UiError>;

    async fn click(&self, selector: &str) -> Result<(), UiError>;
    async fn click_forced(&self, selector: &str) -> Result<(), UiError>;
    async fn click_js(&self, selector: &str) -> Result<(), UiError>;

    /// Type into whatever element currently has focus.
    async fn type_text(&self, text: &str) -> Result<(), UiError>;

    async fn press_enter(&self) -> Result<(), UiError>;

    /// Supply a file to a raw `<input type="file">`.
    async fn set_file_input(&self, selector: &str, file: &Path) -> Result<(), UiError>;

    /// Click an element expected to open a native file chooser and feed the
    /// intercepted chooser the given file.
    async fn click_expecting_file_chooser(
        &self,
        selector: &str,
        file: &Path,
        timeout: Duration,
    ) -> Result<(), UiError>;

    /// `innerText` of the first match, `None` if absent.
    async fn inner_text(&self, selector: &str) -> Result<Option<String>, UiError>;

    async fn page_html(&self) -> Result<String, UiError>;

    /// Write a PNG screenshot of the page to `path`.
    async fn screenshot_to(&self, path: &Path) -> Result<(), UiError>;

    /// Scan an ordered candidate list and return the first selector whose
    /// element is visible. Probe errors on individual candidates are treated
    /// as "not this one" and the scan continues.
    async fn find_first_visible(&self, candidates: &[&str]) -> Result<Option<String>, UiError> {
        for candidate in candidates {
            match self.is_visible(candidate).await {
                Ok(true) => return Ok(Some((*candidate).to_string())),
                Ok(false) => continue,
                Err(err) => {
                    tracing::trace!(selector = candidate, error = %err, "candidate probe failed");
                    continue;
                }
            }
        }
        Ok(None)
    }

    /// Click with the standard fallback cascade: plain click, then forced
    /// (scrolled-into-view) click, then programmatic click. Returns the last
    /// error if every variant fails.
    async fn click_with_fallback(&self, selector: &str) -> Result<(), UiError> {
        match self.click(selector).await {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(selector, error = %err, "plain click failed"),
        }
        match self.click_forced(selector).await {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(selector, error = %err, "forced click failed"),
        }
        self.click_js(selector).await
    }
}

/// Production [`UiDriver`] backed by the CDP page driver.
pub struct CdpUi {
    driver: PageDriver,
}

impl CdpUi {
    pub fn new(driver: PageDriver) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl UiDriver for CdpUi {
    async fn navigate(&self, url: &str) -> Result<(), UiError> {
        self.driver.navigate(url).await
    }

    async fn count(&self, selector: &str) -> Result<usize, UiError> {
        self.driver.count(selector).await
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, UiError> {
        self.driver.is_visible(selector).await
    }

    async fn click(&self, selector: &str) -> Result<(), UiError> {
        self.driver.click(selector).await
    }

    async fn click_forced(&self, selector: &str) -> Result<(), UiError> {
        self.driver.click_forced(selector).await
    }

    async fn click_js(&self, selector: &str) -> Result<(), UiError> {
        self.driver.click_js(selector).await
    }

    async fn type_text(&self, text: &str) -> Result<(), UiError> {
        self.driver.type_text(text).await
    }

    async fn press_enter(&self) -> Result<(), UiError> {
        self.driver.press_enter().await
    }

    async fn set_file_input(&self, selector: &str, file: &Path) -> Result<(), UiError> {
        self.driver.set_file_input(selector, file).await
    }

    async fn click_expecting_file_chooser(
        &self,
        selector: &str,
        file: &Path,
        timeout: Duration,
    ) -> Result<(), UiError> {
        self.driver
            .click_expecting_file_chooser(selector, file, timeout)
            .await
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, UiError> {
        self.driver.inner_text(selector).await
    }

    async fn page_html(&self) -> Result<String, UiError> {
        self.driver.page_html().await
    }

    async fn screenshot_to(&self, path: &Path) -> Result<(), UiError> {
        let png = self.driver.screenshot().await?;
        tokio::fs::write(path, png)
            .await
            .map_err(|e| UiError::Backend(format!("failed to write screenshot: {e}")))
    }
}
