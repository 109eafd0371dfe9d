//! Chrome/Chromium discovery and headless launch for courier sessions.
//!
//! A courier browser is launched with a persistent `--user-data-dir` so the
//! messaging client's authentication survives restarts, and with
//! `--remote-debugging-port` so the CDP driver can attach. After spawning,
//! the DevTools `/json/list` endpoint is polled until a page target appears.
//!
//! One profile directory supports exactly one running browser; the external
//! scheduler guarantees a single courier run at a time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::error::LaunchError;

/// How long to wait for the DevTools endpoint after spawning.
const DEVTOOLS_BOOT_TIMEOUT: Duration = Duration::from_secs(30);
const DEVTOOLS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Well-known Chrome-family binary paths for the current platform.
pub fn platform_candidate_paths() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    }

    #[cfg(target_os = "linux")]
    {
        &[
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium-browser",
            "/usr/bin/chromium",
            "/snap/bin/chromium",
            "/usr/lib/chromium/chromium",
        ]
    }

    #[cfg(target_os = "windows")]
    {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        &[]
    }
}

/// Find a usable Chrome/Chromium binary: explicit override first, then the
/// platform's well-known paths in preference order.
pub fn discover_chrome(explicit: Option<&Path>) -> Result<PathBuf, LaunchError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured chrome_binary not found, falling back to discovery");
    }
    platform_candidate_paths()
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
        .ok_or(LaunchError::NoChromeFound)
}

/// Launch flags mirroring what the messaging client tolerates when driven
/// headlessly.
pub fn launch_args(profile_dir: &Path, devtools_port: u16) -> Vec<String> {
    vec![
        format!("--remote-debugging-port={devtools_port}"),
        format!("--user-data-dir={}", profile_dir.display()),
        "--headless=new".to_string(),
        "--window-size=1920,1080".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-notifications".to_string(),
        "--disable-popup-blocking".to_string(),
        "--disable-infobars".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ]
}

/// A running browser process plus the WebSocket URL of its first page target.
///
/// Dropping the session kills the browser process, so the profile directory
/// is always released when a delivery attempt ends.
pub struct BrowserSession {
    child: Child,
    ws_url: String,
    port: u16,
}

impl BrowserSession {
    /// Spawn a browser against `profile_dir` and wait for a debuggable page
    /// target to appear.
    pub async fn launch(
        chrome_binary: Option<&Path>,
        profile_dir: &Path,
        devtools_port: u16,
    ) -> Result<Self, LaunchError> {
        let binary = discover_chrome(chrome_binary)?;
        if let Err(e) = std::fs::create_dir_all(profile_dir) {
            tracing::warn!(dir = %profile_dir.display(), error = %e, "could not create profile dir");
        }

        tracing::info!(
            binary = %binary.display(),
            profile = %profile_dir.display(),
            port = devtools_port,
            "launching browser"
        );

        let child = Command::new(&binary)
            .args(launch_args(profile_dir, devtools_port))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                binary: binary.display().to_string(),
                source,
            })?;

        let ws_url = wait_for_page_target(devtools_port).await?;
        tracing::info!(ws_url = %ws_url, "browser ready");

        Ok(Self {
            child,
            ws_url,
            port: devtools_port,
        })
    }

    /// WebSocket URL of the page target the driver should attach to.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub fn devtools_port(&self) -> u16 {
        self.port
    }

    /// Kill the browser process. Also happens implicitly on drop.
    pub async fn close(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(error = %e, "failed to kill browser process");
        }
    }
}

/// Poll the DevTools HTTP endpoint until a `page` target is listed, and
/// return its WebSocket debugger URL.
async fn wait_for_page_target(port: u16) -> Result<String, LaunchError> {
    let url = format!("http://127.0.0.1:{port}/json/list");
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + DEVTOOLS_BOOT_TIMEOUT;

    loop {
        if let Ok(response) = client.get(&url).send().await {
            if let Ok(targets) = response.json::<serde_json::Value>().await {
                if let Some(ws) = pick_page_target(&targets) {
                    return Ok(ws);
                }
            }
        }

        if tokio::time::Instant::now() >= deadline {
            // Distinguish "port never answered" from "answered but pageless"
            // by one final probe.
            return match client.get(&url).send().await {
                Ok(_) => Err(LaunchError::NoPageTarget { port }),
                Err(_) => Err(LaunchError::DevtoolsUnreachable {
                    port,
                    duration: DEVTOOLS_BOOT_TIMEOUT,
                }),
            };
        }
        tokio::time::sleep(DEVTOOLS_POLL_INTERVAL).await;
    }
}

/// Pick the first `page`-type target's WebSocket URL from a `/json/list`
/// response body.
pub fn pick_page_target(targets: &serde_json::Value) -> Option<String> {
    targets.as_array()?.iter().find_map(|t| {
        if t.get("type").and_then(|v| v.as_str()) == Some("page") {
            t.get("webSocketDebuggerUrl")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        } else {
            None
        }
    })
}
