//! Low-level Chrome DevTools Protocol (CDP) WebSocket client.
//!
//! Speaks JSON-RPC 2.0 over the DevTools page WebSocket: commands carry an
//! auto-incrementing `id` correlated back to the caller through a oneshot
//! channel; messages without an `id` are events and flow into an unbounded
//! channel that higher layers drain when they need one (e.g. waiting for
//! `Page.fileChooserOpened`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::CdpError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Default per-command response timeout.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// An event pushed by the browser (a message with `method` but no `id`).
#[derive(Debug, Clone)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

/// A response correlated to a command we sent.
#[derive(Debug, Clone)]
pub struct CdpResponse {
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<CdpResponseError>,
}

/// Error object embedded in a CDP response.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CdpResponseError {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct CdpCommand<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

/// Either half of the DevTools message stream, classified by shape.
#[derive(Debug)]
pub enum CdpMessage {
    Response(CdpResponse),
    Event(CdpEvent),
}

/// Classify a raw DevTools JSON message.
///
/// Messages with an `id` field are responses; messages with a `method` and
/// no `id` are events. Anything else is unrecognized and dropped upstream.
pub fn classify_message(json: &Value) -> Option<CdpMessage> {
    if let Some(id) = json.get("id").and_then(|v| v.as_u64()) {
        return Some(CdpMessage::Response(CdpResponse {
            id,
            result: json.get("result").cloned(),
            error: json
                .get("error")
                .and_then(|e| serde_json::from_value(e.clone()).ok()),
        }));
    }
    let method = json.get("method")?.as_str()?.to_string();
    let params = json.get("params").cloned().unwrap_or(Value::Null);
    Some(CdpMessage::Event(CdpEvent { method, params }))
}

/// CDP client over one DevTools page WebSocket.
///
/// Cheap to share: command sending takes `&self`, and the event stream sits
/// behind an async mutex so event waits also work through `&self`.
pub struct CdpClient {
    next_id: AtomicU64,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>,
    writer: Mutex<WsSink>,
    events: Mutex<mpsc::UnboundedReceiver<CdpEvent>>,
    _reader_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a DevTools page target
    /// (`ws://127.0.0.1:{port}/devtools/page/{target_id}`).
    pub async fn connect(ws_url: &str) -> Result<Self, CdpError> {
        tracing::info!(url = ws_url, "connecting to DevTools WebSocket");

        let (stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed {
                url: ws_url.to_string(),
                reason: e.to_string(),
            })?;
        let (writer, reader) = stream.split();

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let reader_task = tokio::spawn(Self::read_loop(reader, Arc::clone(&pending), event_tx));

        Ok(Self {
            next_id: AtomicU64::new(1),
            pending,
            writer: Mutex::new(writer),
            events: Mutex::new(event_rx),
            _reader_task: reader_task,
        })
    }

    /// Send a CDP command and wait for its result with the default timeout.
    pub async fn send(&self, method: &str, params: Value) -> Result<Value, CdpError> {
        self.send_with_timeout(method, params, COMMAND_TIMEOUT).await
    }

    /// Send a CDP command with an explicit response timeout.
    pub async fn send_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cmd = CdpCommand { id, method, params };
        let json = serde_json::to_string(&cmd).map_err(|e| CdpError::Protocol {
            detail: format!("failed to serialize command: {e}"),
        })?;

        tracing::debug!(id, method, "sending CDP command");

        // Register before sending so a fast response cannot race the map.
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        {
            let mut writer = self.writer.lock().await;
            writer
                .send(Message::Text(json.into()))
                .await
                .map_err(|e| CdpError::Protocol {
                    detail: format!("failed to send WebSocket message: {e}"),
                })?;
        }

        let response = tokio::time::timeout(timeout, rx)
            .await
            .map_err(|_| CdpError::Timeout {
                method: method.to_string(),
                duration: timeout,
            })?
            .map_err(|_| CdpError::Protocol {
                detail: "response channel closed unexpectedly".to_string(),
            })?;

        if let Some(err) = response.error {
            return Err(CdpError::Command {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Enable a CDP domain; most domains emit nothing until enabled.
    pub async fn enable_domain(&self, domain: &str) -> Result<(), CdpError> {
        self.send(&format!("{domain}.enable"), serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Wait until an event with the given method arrives, discarding other
    /// events along the way. Returns the event params, or `None` on timeout
    /// or connection loss.
    pub async fn wait_for_event(&self, method: &str, timeout: Duration) -> Option<Value> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut events = self.events.lock().await;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match tokio::time::timeout(remaining, events.recv()).await {
                Ok(Some(event)) if event.method == method => return Some(event.params),
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => return None,
            }
        }
    }

    async fn read_loop(
        mut reader: WsSource,
        pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>,
        event_tx: mpsc::UnboundedSender<CdpEvent>,
    ) {
        while let Some(msg_result) = reader.next().await {
            let msg = match msg_result {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(error = %e, "WebSocket read error, stopping reader");
                    break;
                }
            };

            let text = match msg {
                Message::Text(t) => t.to_string(),
                Message::Binary(b) => match String::from_utf8(b.to_vec()) {
                    Ok(s) => s,
                    Err(_) => continue,
                },
                Message::Close(_) => {
                    tracing::info!("WebSocket closed by remote");
                    break;
                }
                _ => continue,
            };

            let json: Value = match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "unparseable CDP message");
                    continue;
                }
            };

            match classify_message(&json) {
                Some(CdpMessage::Response(response)) => {
                    let mut pending_guard = pending.lock().await;
                    if let Some(tx) = pending_guard.remove(&response.id) {
                        let _ = tx.send(response);
                    } else {
                        tracing::debug!(id = response.id, "response for unknown command id");
                    }
                }
                Some(CdpMessage::Event(event)) => {
                    // Nobody listening is fine; events are advisory.
                    let _ = event_tx.send(event);
                }
                None => {}
            }
        }

        // Fail out any callers still waiting when the connection drops.
        let mut pending_guard = pending.lock().await;
        for (id, tx) in pending_guard.drain() {
            let _ = tx.send(CdpResponse {
                id,
                result: None,
                error: Some(CdpResponseError {
                    code: -1,
                    message: "WebSocket connection closed".to_string(),
                    data: None,
                }),
            });
        }
    }
}
