//! Failure-point screenshots and HTML dumps.
//!
//! A debugging side channel, not a stable interface: dumps are best-effort
//! and never mask the error that triggered them.

use std::path::{Path, PathBuf};

use courier_browser::UiDriver;
use tracing::{debug, warn};

/// Writes diagnostic artifacts into one directory.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stamped(&self, tag: &str, ext: &str) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.dir.join(format!("{tag}_{stamp}.{ext}"))
    }

    /// Screenshot the page under `tag`. Failures are logged and swallowed.
    pub async fn screenshot<U: UiDriver + ?Sized>(&self, ui: &U, tag: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "cannot create diagnostics dir");
            return;
        }
        let path = self.stamped(tag, "png");
        match ui.screenshot_to(&path).await {
            Ok(()) => debug!(path = %path.display(), "diagnostic screenshot written"),
            Err(e) => warn!(tag, error = %e, "diagnostic screenshot failed"),
        }
    }

    /// Dump the page HTML under `tag`. Failures are logged and swallowed.
    pub async fn html_dump<U: UiDriver + ?Sized>(&self, ui: &U, tag: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "cannot create diagnostics dir");
            return;
        }
        let path = self.stamped(tag, "html");
        match ui.page_html().await {
            Ok(html) => {
                if let Err(e) = std::fs::write(&path, html) {
                    warn!(tag, error = %e, "diagnostic HTML dump failed");
                } else {
                    debug!(path = %path.display(), "diagnostic HTML dump written");
                }
            }
            Err(e) => warn!(tag, error = %e, "could not read page HTML for dump"),
        }
    }
}
