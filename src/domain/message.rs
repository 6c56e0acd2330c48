//! Wire messages exchanged between the embedded side and the side panel.
//!
//! Messages travel as JSON objects tagged by a `type` field with camelCase payload
//! fields, e.g. `{"type":"chatMessageDetected","text":"hola"}`.

use serde::{Deserialize, Serialize};

use super::role::ElementRole;
use crate::errors::ChannelError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChannelMessage {
    /// Panel is ready; the embedded side resets and (re)targets.
    SidePanelOpened { tab_id: u32 },
    /// Panel is going away; the embedded side cleans up.
    SidePanelClosed,
    StartElementSelection { element_type: ElementRole },
    ElementSelected { element_type: ElementRole },
    /// New remote text found in the chat area.
    ChatMessageDetected { text: String },
    InjectTextIntoChat {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partner_translation: Option<String>,
    },
    /// Embedded side asks the panel to close, e.g. because the host page unloads.
    CloseSidePanel,
}

const KNOWN_TYPES: &[&str] = &[
    "sidePanelOpened",
    "sidePanelClosed",
    "startElementSelection",
    "elementSelected",
    "chatMessageDetected",
    "injectTextIntoChat",
    "closeSidePanel",
];

impl ChannelMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            ChannelMessage::SidePanelOpened { .. } => "sidePanelOpened",
            ChannelMessage::SidePanelClosed => "sidePanelClosed",
            ChannelMessage::StartElementSelection { .. } => "startElementSelection",
            ChannelMessage::ElementSelected { .. } => "elementSelected",
            ChannelMessage::ChatMessageDetected { .. } => "chatMessageDetected",
            ChannelMessage::InjectTextIntoChat { .. } => "injectTextIntoChat",
            ChannelMessage::CloseSidePanel => "closeSidePanel",
        }
    }
}

/// Result of decoding one raw frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    Message(ChannelMessage),
    /// Well-formed object whose `type` is not one we handle.
    Unknown(String),
    /// Not JSON, no `type`, or a known type with an unusable payload.
    Malformed(String),
}

pub fn encode(message: &ChannelMessage) -> Result<String, ChannelError> {
    serde_json::to_string(message).map_err(|e| ChannelError::Encode(e.to_string()))
}

pub fn decode(raw: &str) -> Decoded {
    let err = match serde_json::from_str::<ChannelMessage>(raw) {
        Ok(message) => return Decoded::Message(message),
        Err(err) => err,
    };

    let type_name = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_owned));

    match type_name {
        Some(t) if !KNOWN_TYPES.contains(&t.as_str()) => Decoded::Unknown(t),
        _ => Decoded::Malformed(err.to_string()),
    }
}
