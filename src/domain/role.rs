use serde::{Deserialize, Serialize};

/// Which region of the host page a target designates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementRole {
    ChatArea,
    InputArea,
}

impl ElementRole {
    pub const ALL: [ElementRole; 2] = [ElementRole::ChatArea, ElementRole::InputArea];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementRole::ChatArea => "chatArea",
            ElementRole::InputArea => "inputArea",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementRole::ChatArea => "chat area",
            ElementRole::InputArea => "input area",
        }
    }
}
