//! High-level page driver over the CDP client.
//!
//! Wraps [`CdpClient`] with the interactions the delivery engine needs:
//! navigation, visibility probes, the three click variants of the fallback
//! cascade, keyboard input, file-input injection, native file-chooser
//! interception, and screenshots.
//!
//! Selector strings are embedded into page JavaScript via
//! [`js_string_literal`], so selectors containing quotes cannot break out of
//! the expression.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde_json::Value;

use crate::cdp::CdpClient;
use crate::error::{CdpError, UiError};

/// Opaque handle to a DOM node, as returned by CDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub i64);

/// Encode a Rust string as a JavaScript string literal.
pub fn js_string_literal(s: &str) -> String {
    // serde_json string encoding is valid JS string literal syntax.
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Compute the center of a CDP content quad (`[x1,y1, .. x4,y4]`).
pub fn quad_center(quad: &[f64]) -> Option<(f64, f64)> {
    if quad.len() < 8 {
        return None;
    }
    let xs: Vec<f64> = quad.iter().step_by(2).copied().collect();
    let ys: Vec<f64> = quad.iter().skip(1).step_by(2).copied().collect();
    let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some(((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
}

/// High-level driver for one DevTools page target.
pub struct PageDriver {
    client: CdpClient,
}

impl PageDriver {
    /// Connect to a page target and enable the Page, DOM, and Runtime
    /// domains.
    pub async fn connect(ws_url: &str) -> Result<Self, CdpError> {
        let client = CdpClient::connect(ws_url).await?;
        client.enable_domain("Page").await?;
        client.enable_domain("DOM").await?;
        client.enable_domain("Runtime").await?;
        Ok(Self { client })
    }

    /// Wrap an existing client (testing and advanced use).
    pub fn from_client(client: CdpClient) -> Self {
        Self { client }
    }

    // -- Navigation ---------------------------------------------------------

    /// Navigate to a URL. Navigation-level failures (DNS, TLS) surface as
    /// `UiError::NavigationFailed`.
    pub async fn navigate(&self, url: &str) -> Result<(), UiError> {
        let result = self
            .client
            .send("Page.navigate", serde_json::json!({ "url": url }))
            .await?;
        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            if !error_text.is_empty() {
                return Err(UiError::NavigationFailed {
                    reason: error_text.to_string(),
                });
            }
        }
        Ok(())
    }

    // -- JavaScript ---------------------------------------------------------

    /// Evaluate a JavaScript expression in the page context.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, UiError> {
        let result = self
            .client
            .send(
                "Runtime.evaluate",
                serde_json::json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let message = exception
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|d| d.as_str())
                .or_else(|| exception.get("text").and_then(|t| t.as_str()))
                .unwrap_or("unknown exception")
                .to_string();
            return Err(UiError::ScriptException { message });
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    // -- DOM queries --------------------------------------------------------

    async fn document_root(&self) -> Result<i64, UiError> {
        let result = self
            .client
            .send("DOM.getDocument", serde_json::json!({}))
            .await?;
        result
            .get("root")
            .and_then(|r| r.get("nodeId"))
            .and_then(|n| n.as_i64())
            .ok_or_else(|| UiError::Backend("DOM.getDocument returned no root nodeId".into()))
    }

    /// Find the first element matching a CSS selector. `Ok(None)` if absent.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, UiError> {
        let root = self.document_root().await?;
        let result = self
            .client
            .send(
                "DOM.querySelector",
                serde_json::json!({ "nodeId": root, "selector": selector }),
            )
            .await?;
        let node_id = result.get("nodeId").and_then(|n| n.as_i64()).unwrap_or(0);
        Ok((node_id != 0).then_some(NodeId(node_id)))
    }

    /// Number of elements matching a CSS selector.
    pub async fn count(&self, selector: &str) -> Result<usize, UiError> {
        let expr = format!(
            "document.querySelectorAll({}).length",
            js_string_literal(selector)
        );
        let value = self.evaluate(&expr).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    /// Whether the first matching element is present and rendered (non-zero
    /// layout box and not `visibility: hidden`).
    pub async fn is_visible(&self, selector: &str) -> Result<bool, UiError> {
        let expr = format!(
            "(() => {{\
               const el = document.querySelector({sel});\
               if (!el) return false;\
               const rect = el.getBoundingClientRect();\
               if (rect.width <= 0 || rect.height <= 0) return false;\
               return getComputedStyle(el).visibility !== 'hidden';\
             }})()",
            sel = js_string_literal(selector)
        );
        Ok(self.evaluate(&expr).await?.as_bool().unwrap_or(false))
    }

    /// `innerText` of the first matching element, or `None` if absent.
    pub async fn inner_text(&self, selector: &str) -> Result<Option<String>, UiError> {
        let expr = format!(
            "(() => {{\
               const el = document.querySelector({sel});\
               return el ? el.innerText : null;\
             }})()",
            sel = js_string_literal(selector)
        );
        let value = self.evaluate(&expr).await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    /// Full page HTML, for failure-point dumps.
    pub async fn page_html(&self) -> Result<String, UiError> {
        let value = self.evaluate("document.documentElement.outerHTML").await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| UiError::Backend("outerHTML did not return a string".into()))
    }

    // -- Clicking -----------------------------------------------------------

    async fn element_center(&self, node_id: NodeId, selector: &str) -> Result<(f64, f64), UiError> {
        let result = self
            .client
            .send(
                "DOM.getBoxModel",
                serde_json::json!({ "nodeId": node_id.0 }),
            )
            .await?;
        let content: Vec<f64> = result
            .get("model")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_f64()).collect())
            .unwrap_or_default();

        quad_center(&content).ok_or_else(|| UiError::NotInteractable {
            selector: selector.to_string(),
            reason: "no usable box model".to_string(),
        })
    }

    async fn dispatch_click_at(&self, x: f64, y: f64) -> Result<(), CdpError> {
        for event_type in ["mousePressed", "mouseReleased"] {
            self.client
                .send(
                    "Input.dispatchMouseEvent",
                    serde_json::json!({
                        "type": event_type,
                        "x": x,
                        "y": y,
                        "button": "left",
                        "clickCount": 1,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    /// Plain click: box-model center + synthesized mouse events.
    pub async fn click(&self, selector: &str) -> Result<(), UiError> {
        let node_id = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| UiError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        let (cx, cy) = self.element_center(node_id, selector).await?;
        self.dispatch_click_at(cx, cy).await?;
        Ok(())
    }

    /// Forced click: scroll the element into view first, then click at the
    /// center of its client rect even if the box model is degenerate.
    pub async fn click_forced(&self, selector: &str) -> Result<(), UiError> {
        let expr = format!(
            "(() => {{\
               const el = document.querySelector({sel});\
               if (!el) return null;\
               el.scrollIntoView({{ block: 'center', inline: 'center' }});\
               const r = el.getBoundingClientRect();\
               return [r.left + r.width / 2, r.top + r.height / 2];\
             }})()",
            sel = js_string_literal(selector)
        );
        let value = self.evaluate(&expr).await?;
        let coords = value
            .as_array()
            .and_then(|a| {
                let x = a.first()?.as_f64()?;
                let y = a.get(1)?.as_f64()?;
                Some((x, y))
            })
            .ok_or_else(|| UiError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        self.dispatch_click_at(coords.0, coords.1).await?;
        Ok(())
    }

    /// Programmatic click: invoke the element's `click()` in page JS.
    pub async fn click_js(&self, selector: &str) -> Result<(), UiError> {
        let expr = format!(
            "(() => {{\
               const el = document.querySelector({sel});\
               if (!el) return false;\
               el.click();\
               return true;\
             }})()",
            sel = js_string_literal(selector)
        );
        if self.evaluate(&expr).await?.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(UiError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    // -- Keyboard -----------------------------------------------------------

    /// Type text into whatever element currently has focus, one key event
    /// pair per character.
    pub async fn type_text(&self, text: &str) -> Result<(), UiError> {
        for ch in text.chars() {
            let ch_str = ch.to_string();
            for event_type in ["keyDown", "keyUp"] {
                self.client
                    .send(
                        "Input.dispatchKeyEvent",
                        serde_json::json!({
                            "type": event_type,
                            "text": ch_str,
                            "unmodifiedText": ch_str,
                            "key": ch_str,
                        }),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Press Enter on the focused element.
    pub async fn press_enter(&self) -> Result<(), UiError> {
        for event_type in ["rawKeyDown", "char", "keyUp"] {
            self.client
                .send(
                    "Input.dispatchKeyEvent",
                    serde_json::json!({
                        "type": event_type,
                        "key": "Enter",
                        "code": "Enter",
                        "text": "\r",
                        "unmodifiedText": "\r",
                        "windowsVirtualKeyCode": 13,
                        "nativeVirtualKeyCode": 13,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    // -- File injection -----------------------------------------------------

    /// Set the files of a matching `<input type="file">` directly.
    pub async fn set_file_input(&self, selector: &str, file: &Path) -> Result<(), UiError> {
        let node_id = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| UiError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        self.client
            .send(
                "DOM.setFileInputFiles",
                serde_json::json!({
                    "nodeId": node_id.0,
                    "files": [file.to_string_lossy()],
                }),
            )
            .await?;
        Ok(())
    }

    /// Click an element that opens a native file chooser, intercept the
    /// chooser, and supply `file` to it.
    ///
    /// The click itself is attempted plain first and programmatically as a
    /// fallback; menu entries in the client are sometimes occluded by the
    /// menu animation when the click lands.
    pub async fn click_expecting_file_chooser(
        &self,
        selector: &str,
        file: &Path,
        timeout: Duration,
    ) -> Result<(), UiError> {
        self.client
            .send(
                "Page.setInterceptFileChooserDialog",
                serde_json::json!({ "enabled": true }),
            )
            .await?;

        let click_result = match self.click(selector).await {
            Ok(()) => Ok(()),
            Err(_) => self.click_js(selector).await,
        };
        if let Err(err) = click_result {
            let _ = self.disable_chooser_interception().await;
            return Err(err);
        }

        let params = self
            .client
            .wait_for_event("Page.fileChooserOpened", timeout)
            .await;
        let supplied = match params {
            Some(params) => {
                let backend_node_id = params.get("backendNodeId").and_then(|v| v.as_i64());
                match backend_node_id {
                    Some(id) => self
                        .client
                        .send(
                            "DOM.setFileInputFiles",
                            serde_json::json!({
                                "backendNodeId": id,
                                "files": [file.to_string_lossy()],
                            }),
                        )
                        .await
                        .map_err(UiError::from),
                    None => Err(UiError::Backend(
                        "fileChooserOpened event carried no backendNodeId".into(),
                    )),
                }
            }
            None => Err(UiError::FileChooserTimeout { duration: timeout }),
        };

        let _ = self.disable_chooser_interception().await;
        supplied.map(|_| ())
    }

    async fn disable_chooser_interception(&self) -> Result<(), CdpError> {
        self.client
            .send(
                "Page.setInterceptFileChooserDialog",
                serde_json::json!({ "enabled": false }),
            )
            .await?;
        Ok(())
    }

    // -- Screenshots --------------------------------------------------------

    /// Capture the current page as PNG bytes.
    pub async fn screenshot(&self) -> Result<Vec<u8>, UiError> {
        let result = self
            .client
            .send(
                "Page.captureScreenshot",
                serde_json::json!({ "format": "png" }),
            )
            .await?;
        let data = result
            .get("data")
            .and_then(|d| d.as_str())
            .ok_or_else(|| UiError::Backend("captureScreenshot returned no data".into()))?;
        B64.decode(data)
            .map_err(|e| UiError::Backend(format!("failed to decode screenshot base64: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_literal_escapes_quotes() {
        let lit = js_string_literal(r#"span[title="FOFO sales/ and query"]"#);
        assert!(lit.starts_with('"') && lit.ends_with('"'));
        assert!(lit.contains(r#"\"FOFO"#));
    }

    #[test]
    fn js_string_literal_handles_backslashes_and_newlines() {
        let lit = js_string_literal("a\\b\nc");
        assert_eq!(lit, r#""a\\b\nc""#);
    }

    #[test]
    fn quad_center_of_square() {
        let quad = [0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0];
        let (cx, cy) = quad_center(&quad).unwrap();
        assert!((cx - 50.0).abs() < 0.001);
        assert!((cy - 50.0).abs() < 0.001);
    }

    #[test]
    fn quad_center_of_offset_rect() {
        let quad = [50.0, 75.0, 250.0, 75.0, 250.0, 175.0, 50.0, 175.0];
        let (cx, cy) = quad_center(&quad).unwrap();
        assert!((cx - 150.0).abs() < 0.001);
        assert!((cy - 125.0).abs() < 0.001);
    }

    #[test]
    fn quad_center_rejects_short_quads() {
        assert!(quad_center(&[0.0, 0.0, 100.0, 0.0]).is_none());
        assert!(quad_center(&[]).is_none());
    }

    #[test]
    fn node_id_semantics() {
        assert_eq!(NodeId(42), NodeId(42));
        assert_ne!(NodeId(1), NodeId(2));
    }

    // Response-shape checks so a CDP schema drift shows up here rather than
    // in production logs.

    #[test]
    fn file_chooser_event_shape() {
        let params = serde_json::json!({
            "frameId": "F1",
            "mode": "selectSingle",
            "backendNodeId": 99
        });
        assert_eq!(params.get("backendNodeId").and_then(|v| v.as_i64()), Some(99));
    }

    #[test]
    fn query_selector_miss_is_node_zero() {
        let response = serde_json::json!({ "nodeId": 0 });
        let node_id = response.get("nodeId").and_then(|n| n.as_i64()).unwrap();
        assert_eq!(node_id, 0);
    }
}
