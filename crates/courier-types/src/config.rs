//! Configuration for a courier installation.
//!
//! [`CourierConfig`] is loaded from `courier.toml` and then overlaid with
//! `COURIER_*` environment variables. Every timing and threshold knob used
//! by the delivery state machines lives here with a serde default, so a
//! minimal config file (or none at all) yields the production constants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

/// Session manager timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between readiness polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Bound on the whole load wait, in seconds.
    pub load_timeout_secs: u64,
    /// Consecutive polls a ready landmark must survive before the session
    /// is declared `Ready` (flicker guard).
    pub required_ready_polls: u32,
    /// Interval between polls while blocked on the authentication code,
    /// in milliseconds. This wait is intentionally unbounded.
    pub auth_poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3_000,
            load_timeout_secs: 120,
            required_ready_polls: 3,
            auth_poll_interval_ms: 6_000,
        }
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn auth_poll_interval(&self) -> Duration {
        Duration::from_millis(self.auth_poll_interval_ms)
    }
}

/// Conversation locator timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocatorConfig {
    /// Bound on the search-input hunt, in seconds.
    pub search_timeout_secs: u64,
    /// Interval between search-input polls, in milliseconds.
    pub search_poll_interval_ms: u64,
    /// Wait after typing the label for results to render, ms.
    pub results_settle_ms: u64,
    /// Wait after dismissing a blocking overlay, ms.
    pub popup_settle_ms: u64,
    /// Wait after clicking a result before verifying the conversation, ms.
    pub open_settle_ms: u64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: 80,
            search_poll_interval_ms: 2_000,
            results_settle_ms: 6_000,
            popup_settle_ms: 2_000,
            open_settle_ms: 6_000,
        }
    }
}

impl LocatorConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn search_poll_interval(&self) -> Duration {
        Duration::from_millis(self.search_poll_interval_ms)
    }

    pub fn results_settle(&self) -> Duration {
        Duration::from_millis(self.results_settle_ms)
    }

    pub fn popup_settle(&self) -> Duration {
        Duration::from_millis(self.popup_settle_ms)
    }

    pub fn open_settle(&self) -> Duration {
        Duration::from_millis(self.open_settle_ms)
    }
}

/// Attachment pipeline timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AttachConfig {
    /// Bound on the attach-affordance hunt, in seconds.
    pub button_timeout_secs: u64,
    /// Interval between attach-affordance polls, in milliseconds.
    pub button_poll_interval_ms: u64,
    /// Wait after opening the attach menu before probing entries, ms.
    pub menu_settle_ms: u64,
    /// Bound on the intercepted file-chooser wait, in seconds.
    pub chooser_timeout_secs: u64,
    /// Wait after a successful file injection for the upload preview to
    /// render, in seconds.
    pub upload_settle_secs: u64,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            button_timeout_secs: 30,
            button_poll_interval_ms: 1_000,
            menu_settle_ms: 3_000,
            chooser_timeout_secs: 10,
            upload_settle_secs: 10,
        }
    }
}

impl AttachConfig {
    pub fn button_timeout(&self) -> Duration {
        Duration::from_secs(self.button_timeout_secs)
    }

    pub fn button_poll_interval(&self) -> Duration {
        Duration::from_millis(self.button_poll_interval_ms)
    }

    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }

    pub fn chooser_timeout(&self) -> Duration {
        Duration::from_secs(self.chooser_timeout_secs)
    }

    pub fn upload_settle(&self) -> Duration {
        Duration::from_secs(self.upload_settle_secs)
    }
}

/// Caption/send controller timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SendConfig {
    /// Bound on the send-control search poll, in seconds.
    pub control_timeout_secs: u64,
    /// Interval between send-control polls, in milliseconds.
    pub control_poll_interval_ms: u64,
    /// Wait after typing the caption before looking for the send control, ms.
    pub caption_settle_ms: u64,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            control_timeout_secs: 60,
            control_poll_interval_ms: 500,
            caption_settle_ms: 2_000,
        }
    }
}

impl SendConfig {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_secs)
    }

    pub fn control_poll_interval(&self) -> Duration {
        Duration::from_millis(self.control_poll_interval_ms)
    }

    pub fn caption_settle(&self) -> Duration {
        Duration::from_millis(self.caption_settle_ms)
    }
}

/// Delivery verifier thresholds and timing.
///
/// The distinct-signal and stability thresholds were chosen empirically
/// against the real client; they are configuration rather than constants so
/// deployments can tune them without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifierConfig {
    /// Bound on waiting for the upload preview dialog to close, in seconds.
    pub dialog_close_timeout_secs: u64,
    /// Interval between dialog-close polls, in milliseconds.
    pub dialog_poll_interval_ms: u64,
    /// Unconditional wait for the client to process the send, in seconds.
    pub processing_wait_secs: u64,
    /// Bound on the signal-collection loop, in seconds.
    pub signal_timeout_secs: u64,
    /// Interval between signal-collection polls, in milliseconds.
    pub signal_poll_interval_ms: u64,
    /// Minimum number of distinct signal kinds required for `Verified`.
    pub min_distinct_signals: usize,
    /// Consecutive polls the signal set must be unchanged before promotion.
    pub required_stable_polls: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            dialog_close_timeout_secs: 15,
            dialog_poll_interval_ms: 1_000,
            processing_wait_secs: 45,
            signal_timeout_secs: 60,
            signal_poll_interval_ms: 2_000,
            min_distinct_signals: 3,
            required_stable_polls: 2,
        }
    }
}

impl VerifierConfig {
    pub fn dialog_close_timeout(&self) -> Duration {
        Duration::from_secs(self.dialog_close_timeout_secs)
    }

    pub fn dialog_poll_interval(&self) -> Duration {
        Duration::from_millis(self.dialog_poll_interval_ms)
    }

    pub fn processing_wait(&self) -> Duration {
        Duration::from_secs(self.processing_wait_secs)
    }

    pub fn signal_timeout(&self) -> Duration {
        Duration::from_secs(self.signal_timeout_secs)
    }

    pub fn signal_poll_interval(&self) -> Duration {
        Duration::from_millis(self.signal_poll_interval_ms)
    }
}

/// Top-level configuration for a courier installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Entry URL of the web messaging client.
    pub entry_url: String,
    /// Default destination conversation label.
    pub recipient_label: String,
    /// Caption template; `{date}` is replaced with the report date.
    pub caption_template: String,
    /// Persistent browser profile directory. Prior authentication lives
    /// here, so it must survive between runs.
    pub profile_dir: PathBuf,
    /// Path of the sent-dates ledger file.
    pub ledger_path: PathBuf,
    /// Directory for diagnostic screenshots and HTML dumps.
    pub diagnostics_dir: PathBuf,
    /// DevTools debugging port for the launched browser.
    pub devtools_port: u16,
    /// Explicit Chrome/Chromium binary path; discovered if unset.
    pub chrome_binary: Option<PathBuf>,
    /// Maximum entries retained in the ledger after an append.
    pub ledger_max_entries: usize,
    pub session: SessionConfig,
    pub locator: LocatorConfig,
    pub attach: AttachConfig,
    pub send: SendConfig,
    pub verifier: VerifierConfig,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            entry_url: "https://web.whatsapp.com".to_string(),
            recipient_label: String::new(),
            caption_template: "Sales report of {date}".to_string(),
            profile_dir: PathBuf::from("./profile"),
            ledger_path: PathBuf::from("./sent_dates.txt"),
            diagnostics_dir: PathBuf::from("./diagnostics"),
            devtools_port: 9222,
            chrome_binary: None,
            ledger_max_entries: 90,
            session: SessionConfig::default(),
            locator: LocatorConfig::default(),
            attach: AttachConfig::default(),
            send: SendConfig::default(),
            verifier: VerifierConfig::default(),
        }
    }
}

impl CourierConfig {
    /// Load configuration from a TOML file, then apply `COURIER_*`
    /// environment variable overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults overlaid with environment variables only, for
    /// installations that run without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Expand the caption template for a report date string.
    pub fn caption_for(&self, date: &str) -> String {
        self.caption_template.replace("{date}", date)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("COURIER_ENTRY_URL") {
            self.entry_url = v;
        }
        if let Ok(v) = std::env::var("COURIER_RECIPIENT") {
            self.recipient_label = v;
        }
        if let Ok(v) = std::env::var("COURIER_PROFILE_DIR") {
            self.profile_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("COURIER_LEDGER_PATH") {
            self.ledger_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("COURIER_DIAGNOSTICS_DIR") {
            self.diagnostics_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("COURIER_DEVTOOLS_PORT") {
            if let Ok(port) = v.parse() {
                self.devtools_port = port;
            }
        }
        if let Ok(v) = std::env::var("COURIER_CHROME_BINARY") {
            self.chrome_binary = Some(PathBuf::from(v));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_url.is_empty() {
            return Err(ConfigError::Invalid {
                field: "entry_url".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.ledger_max_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "ledger_max_entries".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.verifier.min_distinct_signals == 0 {
            return Err(ConfigError::Invalid {
                field: "verifier.min_distinct_signals".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.session.required_ready_polls == 0 {
            return Err(ConfigError::Invalid {
                field: "session.required_ready_polls".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
