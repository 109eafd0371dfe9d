//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use courier_browser::{UiDriver, UiError};
use courier_types::CourierConfig;

/// A scripted sequence of answers: each query consumes one entry, and the
/// final entry repeats forever. Models DOM state that settles over time
/// (e.g. a landmark that flickers during load, then stays).
#[derive(Debug, Clone)]
pub struct Script<T: Clone> {
    answers: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    pub fn constant(value: T) -> Self {
        Self {
            answers: VecDeque::from([value]),
        }
    }

    pub fn sequence(values: Vec<T>) -> Self {
        assert!(!values.is_empty(), "script needs at least one answer");
        Self {
            answers: values.into(),
        }
    }

    fn next(&mut self) -> T {
        if self.answers.len() > 1 {
            self.answers.pop_front().unwrap()
        } else {
            self.answers.front().unwrap().clone()
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    visibility: HashMap<String, Script<bool>>,
    counts: HashMap<String, Script<usize>>,
    texts: HashMap<String, String>,
    fail_plain_click: HashSet<String>,
    fail_all_clicks: HashSet<String>,
    typing_fail_after: Option<usize>,
    type_calls: usize,
    chooser_broken: bool,
    navigations: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<String>,
    enter_presses: u32,
    direct_files: Vec<(String, PathBuf)>,
    chooser_files: Vec<(String, PathBuf)>,
}

/// Scripted in-memory [`UiDriver`] simulating the messaging client's DOM.
///
/// Unscripted selectors are invisible with count zero and no text.
#[derive(Debug, Default)]
pub struct FakeUi {
    state: Mutex<FakeState>,
}

impl FakeUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a selector permanently visible (or not).
    pub fn set_visible(&self, selector: &str, visible: bool) {
        self.state
            .lock()
            .unwrap()
            .visibility
            .insert(selector.to_string(), Script::constant(visible));
    }

    /// Script a selector's visibility poll-by-poll; the last entry repeats.
    pub fn script_visibility(&self, selector: &str, answers: Vec<bool>) {
        self.state
            .lock()
            .unwrap()
            .visibility
            .insert(selector.to_string(), Script::sequence(answers));
    }

    pub fn set_count(&self, selector: &str, count: usize) {
        self.state
            .lock()
            .unwrap()
            .counts
            .insert(selector.to_string(), Script::constant(count));
    }

    /// Script a selector's match count query-by-query; the last entry repeats.
    pub fn script_count(&self, selector: &str, answers: Vec<usize>) {
        self.state
            .lock()
            .unwrap()
            .counts
            .insert(selector.to_string(), Script::sequence(answers));
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.state
            .lock()
            .unwrap()
            .texts
            .insert(selector.to_string(), text.to_string());
    }

    /// Make plain clicks on a selector fail (forced/JS clicks still work).
    pub fn break_plain_click(&self, selector: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_plain_click
            .insert(selector.to_string());
    }

    /// Make every click variant fail on a selector.
    pub fn break_all_clicks(&self, selector: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_all_clicks
            .insert(selector.to_string());
    }

    /// Make `type_text` fail after the first `n` successful calls.
    pub fn fail_typing_after(&self, n: usize) {
        self.state.lock().unwrap().typing_fail_after = Some(n);
    }

    /// Make file-chooser interception time out for every selector.
    pub fn break_file_chooser(&self) {
        self.state.lock().unwrap().chooser_broken = true;
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn enter_presses(&self) -> u32 {
        self.state.lock().unwrap().enter_presses
    }

    /// Files supplied straight to a raw file input.
    pub fn direct_files(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().unwrap().direct_files.clone()
    }

    /// Files supplied through an intercepted native chooser.
    pub fn chooser_files(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().unwrap().chooser_files.clone()
    }
}

#[async_trait]
impl UiDriver for FakeUi {
    async fn navigate(&self, url: &str) -> Result<(), UiError> {
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize, UiError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .counts
            .get_mut(selector)
            .map(Script::next)
            .unwrap_or(0))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, UiError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .visibility
            .get_mut(selector)
            .map(Script::next)
            .unwrap_or(false))
    }

    async fn click(&self, selector: &str) -> Result<(), UiError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_plain_click.contains(selector) || state.fail_all_clicks.contains(selector) {
            return Err(UiError::NotInteractable {
                selector: selector.to_string(),
                reason: "scripted plain-click failure".to_string(),
            });
        }
        state.clicks.push(selector.to_string());
        Ok(())
    }

    async fn click_forced(&self, selector: &str) -> Result<(), UiError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all_clicks.contains(selector) {
            return Err(UiError::NotInteractable {
                selector: selector.to_string(),
                reason: "scripted forced-click failure".to_string(),
            });
        }
        state.clicks.push(format!("forced:{selector}"));
        Ok(())
    }

    async fn click_js(&self, selector: &str) -> Result<(), UiError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all_clicks.contains(selector) {
            return Err(UiError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        state.clicks.push(format!("js:{selector}"));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), UiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = state.typing_fail_after {
            if state.type_calls >= limit {
                return Err(UiError::NotInteractable {
                    selector: "focused element".to_string(),
                    reason: "scripted typing failure".to_string(),
                });
            }
        }
        state.type_calls += 1;
        state.typed.push(text.to_string());
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), UiError> {
        self.state.lock().unwrap().enter_presses += 1;
        Ok(())
    }

    async fn set_file_input(&self, selector: &str, file: &Path) -> Result<(), UiError> {
        self.state
            .lock()
            .unwrap()
            .direct_files
            .push((selector.to_string(), file.to_path_buf()));
        Ok(())
    }

    async fn click_expecting_file_chooser(
        &self,
        selector: &str,
        file: &Path,
        timeout: Duration,
    ) -> Result<(), UiError> {
        let mut state = self.state.lock().unwrap();
        if state.chooser_broken {
            return Err(UiError::FileChooserTimeout { duration: timeout });
        }
        state
            .chooser_files
            .push((selector.to_string(), file.to_path_buf()));
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, UiError> {
        Ok(self.state.lock().unwrap().texts.get(selector).cloned())
    }

    async fn page_html(&self) -> Result<String, UiError> {
        Ok("<html></html>".to_string())
    }

    async fn screenshot_to(&self, _path: &Path) -> Result<(), UiError> {
        Ok(())
    }
}

/// Config with every wait shrunk to test scale.
pub fn fast_config(diagnostics_dir: &Path) -> CourierConfig {
    let mut config = CourierConfig::default();
    config.recipient_label = "Sales group".to_string();
    config.diagnostics_dir = diagnostics_dir.to_path_buf();

    config.session.poll_interval_ms = 1;
    config.session.load_timeout_secs = 1;
    config.session.auth_poll_interval_ms = 1;

    config.locator.search_timeout_secs = 1;
    config.locator.search_poll_interval_ms = 1;
    config.locator.results_settle_ms = 1;
    config.locator.popup_settle_ms = 1;
    config.locator.open_settle_ms = 1;

    config.attach.button_timeout_secs = 1;
    config.attach.button_poll_interval_ms = 1;
    config.attach.menu_settle_ms = 1;
    config.attach.chooser_timeout_secs = 1;
    config.attach.upload_settle_secs = 0;

    config.send.control_timeout_secs = 1;
    config.send.control_poll_interval_ms = 1;
    config.send.caption_settle_ms = 1;

    config.verifier.dialog_close_timeout_secs = 1;
    config.verifier.dialog_poll_interval_ms = 1;
    config.verifier.processing_wait_secs = 0;
    config.verifier.signal_timeout_secs = 1;
    config.verifier.signal_poll_interval_ms = 1;

    config
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Write a minimal well-formed PDF artifact.
pub fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\n%%EOF\n").unwrap();
    path
}
