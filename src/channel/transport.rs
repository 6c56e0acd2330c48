use std::fmt;

use crate::errors::ChannelError;

/// Addressable execution context, such as a host tab or the side panel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub String);

impl ContextId {
    pub fn tab(tab_id: u32) -> Self {
        Self(format!("tab:{tab_id}"))
    }

    pub fn panel() -> Self {
        Self("side-panel".to_string())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortEvent {
    Message(String),
    /// The other end closed the port or the link was severed.
    Disconnected,
}

/// One end of an established named connection.
pub trait Port {
    /// Fails with [`ChannelError::Disconnected`] once the link is gone.
    fn post(&mut self, raw: &str) -> Result<(), ChannelError>;

    /// Frames and lifecycle notices that arrived since the last poll.
    fn poll(&mut self) -> Vec<PortEvent>;

    /// Closes this end. The peer observes [`PortEvent::Disconnected`]; this end does not.
    fn close(&mut self);
}

/// Opens named connections to other contexts.
pub trait Transport {
    type Port: Port;

    fn connect(&mut self, target: &ContextId, name: &str) -> Result<Self::Port, ChannelError>;
}
