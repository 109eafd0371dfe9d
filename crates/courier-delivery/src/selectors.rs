//! Ordered DOM candidate lists for the messaging client.
//!
//! The client's element identifiers are unstable across releases, so every
//! lookup works through an ordered list of known-good candidates: first
//! visible match wins. The lists live here as plain data, not inline control
//! flow, so they can be tuned and tested independently of the stages that
//! consume them.

/// All candidate selector lists used by the delivery flow.
#[derive(Debug, Clone)]
pub struct SelectorBook {
    /// Landmarks that exist only once the inbox UI is rendered.
    pub ready_landmarks: Vec<String>,
    /// Indicators that the client is waiting for an authentication scan.
    pub auth_pending: Vec<String>,
    /// Dismiss controls of overlays that block the UI.
    pub popup_dismiss: Vec<String>,
    /// The conversation search input.
    pub search_inputs: Vec<String>,
    /// Placeholder-text fallbacks for the search input.
    pub search_placeholder_fallback: Vec<String>,
    /// Icon that reveals the search input when clicked.
    pub search_icons: Vec<String>,
    /// Generic "first search result" rows.
    pub chat_results: Vec<String>,
    /// The message-compose control of an open conversation.
    pub compose_box: Vec<String>,
    /// Attach affordance, scoped to the compose footer.
    pub attach_buttons: Vec<String>,
    /// "Document" entry in the attach menu.
    pub document_menu_items: Vec<String>,
    /// Raw file inputs not restricted to images.
    pub file_inputs: Vec<String>,
    /// Positional last-resort: the second item of the open attach menu.
    pub menu_second_item: Vec<String>,
    /// Caption input in the upload preview.
    pub caption_inputs: Vec<String>,
    /// Send control in the upload preview.
    pub send_buttons: Vec<String>,
    /// Upload preview dialogs that must close after a send.
    pub upload_dialogs: Vec<String>,
    /// Error indicators on a failed outgoing message.
    pub error_indicators: Vec<String>,
    /// Delivery checkmarks on an outgoing message.
    pub checkmarks: Vec<String>,
    /// Document/attachment indicators inside an outgoing message.
    pub document_indicators: Vec<String>,
    /// All outgoing message bubbles (for count baselines).
    pub outgoing_messages: String,
    /// The most recent outgoing message bubble.
    pub last_outgoing_message: String,
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorBook {
    fn default() -> Self {
        Self {
            ready_landmarks: list(&[
                "[data-testid=\"chat-list-search\"]",
                "div[contenteditable=\"true\"][data-tab=\"3\"]",
                "#side",
                "div#pane-side",
                "div[data-testid=\"chatlist-content\"]",
                "[data-testid=\"cell-frame-container\"]",
            ]),
            auth_pending: list(&[
                "canvas[aria-label*=\"Scan\"]",
                "canvas[role=\"img\"]",
                "div[data-ref]",
            ]),
            popup_dismiss: list(&[
                "div[data-testid=\"popup-controls-ok\"]",
                "[data-animate-modal-popup=\"true\"] div[role=\"button\"]",
                "span[data-icon=\"x\"]",
                "span[data-icon=\"x-light\"]",
                "div[aria-label=\"Close\"]",
                "button[aria-label=\"Close\"]",
            ]),
            search_inputs: list(&[
                "[data-testid=\"chat-list-search\"]",
                "div[contenteditable=\"true\"][data-tab=\"3\"]",
                "[aria-label=\"Search input textbox\"]",
                "div[role=\"textbox\"][data-tab=\"3\"]",
                "div.selectable-text[contenteditable=\"true\"][data-tab=\"3\"]",
                "div#side div[role=\"textbox\"]",
                "div[data-testid=\"chatlist-header\"] div[role=\"textbox\"]",
                "header div[contenteditable=\"true\"]",
            ]),
            search_placeholder_fallback: list(&[
                "div[aria-placeholder*=\"Search\"]",
                "input[placeholder*=\"Search\"]",
            ]),
            search_icons: list(&[
                "span[data-icon=\"search\"]",
                "button[aria-label=\"Search or start new chat\"]",
            ]),
            chat_results: list(&[
                "[data-testid=\"cell-frame-container\"]",
                "div[role=\"listitem\"]",
            ]),
            compose_box: list(&[
                "[data-testid=\"conversation-compose-box-input\"]",
                "div[contenteditable=\"true\"][data-tab=\"10\"]",
                "[aria-label=\"Type a message\"]",
            ]),
            attach_buttons: list(&[
                "footer div[title=\"Attach\"]",
                "footer button[aria-label=\"Attach\"]",
                "footer div[aria-label=\"Attach\"]",
                "footer span[data-icon=\"plus\"]",
                "footer span[data-icon=\"attach-menu-plus\"]",
                "footer span[data-icon=\"clip\"]",
            ]),
            document_menu_items: list(&[
                "li[data-testid=\"mi-attach-document\"]",
                "[aria-label*=\"Document\"]",
                "li[data-animate-dropdown-item=\"true\"]:nth-of-type(1)",
            ]),
            file_inputs: list(&[
                "input[type=\"file\"]:not([accept*=\"image\"])",
                "input[type=\"file\"][accept*=\"pdf\"]",
                "input[type=\"file\"][multiple]",
            ]),
            menu_second_item: list(&[
                "div[data-animate-dropdown=\"true\"] li:nth-of-type(2)",
                "ul li:nth-of-type(2)",
            ]),
            caption_inputs: list(&[
                "div[contenteditable=\"true\"][data-tab=\"10\"]",
                "div[contenteditable=\"true\"][data-lexical-editor=\"true\"]",
                "div[aria-placeholder*=\"caption\"]",
                "div.copyable-text[contenteditable=\"true\"]",
            ]),
            send_buttons: list(&[
                "span[data-icon=\"send\"]",
                "[data-testid=\"send\"]",
                "button[aria-label=\"Send\"]",
                "div[role=\"button\"][aria-label=\"Send\"]",
            ]),
            upload_dialogs: list(&[
                "div[data-testid=\"media-viewer\"]",
                "div[data-testid=\"document-viewer\"]",
                "div[role=\"dialog\"]",
            ]),
            error_indicators: list(&[
                "span[data-icon=\"msg-dblcheck-error\"]",
                "span[data-icon=\"error\"]",
                "span[aria-label=\"Failed to send\"]",
                "button[aria-label*=\"try again\"]",
            ]),
            checkmarks: list(&[
                "div.message-out:last-of-type span[data-icon=\"msg-check\"]",
                "div.message-out:last-of-type span[data-icon=\"msg-dblcheck\"]",
                "div.message-out:last-of-type span[data-icon=\"msg-dblcheck-ack\"]",
            ]),
            document_indicators: list(&[
                "div.message-out:last-of-type span[data-icon=\"document\"]",
                "div.message-out:last-of-type span[data-icon=\"document-refreshed-thin\"]",
            ]),
            outgoing_messages: "div.message-out".to_string(),
            last_outgoing_message: "div.message-out:last-of-type".to_string(),
        }
    }
}

impl SelectorBook {
    /// Selector matching a chat-list entry by its exact display label.
    pub fn exact_chat_result(&self, label: &str) -> String {
        // Quotes in a label would otherwise terminate the attribute value.
        let escaped = label.replace('\\', "\\\\").replace('"', "\\\"");
        format!("span[title=\"{escaped}\"]")
    }

    /// Candidate slices for `find_first_visible` calls.
    pub fn as_refs(items: &[String]) -> Vec<&str> {
        items.iter().map(String::as_str).collect()
    }
}
