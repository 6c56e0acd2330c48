//! Long-lived bidirectional messaging between the embedded side and the side panel.
//!
//! A `Channel` holds at most one port. Frames are decoded into [`ChannelMessage`]s on
//! poll; frames that do not decode are logged and dropped. A send on a closed or broken
//! channel makes exactly one reconnect attempt to the last known peer before giving up.

pub mod loopback;
pub mod transport;

pub use loopback::{Incoming, LoopbackHub, LoopbackPort, LoopbackTransport};
pub use transport::{ContextId, Port, PortEvent, Transport};

use crate::{
    domain::{ChannelMessage, Decoded, decode, encode},
    errors::ChannelError,
};

/// Port name both sides agree on.
pub const CHANNEL_NAME: &str = "chat-bridge";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

impl ChannelState {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelState::Closed => "closed",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    Message(ChannelMessage),
    /// The peer went away. The owner tears down, then calls [`Channel::disconnect`].
    Disconnected,
}

pub struct Channel<T: Transport> {
    transport: T,
    name: String,
    peer: Option<ContextId>,
    port: Option<T::Port>,
    state: ChannelState,
}

impl<T: Transport> Channel<T> {
    pub fn new(transport: T, name: &str) -> Self {
        Self {
            transport,
            name: name.to_string(),
            peer: None,
            port: None,
            state: ChannelState::Closed,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    pub fn peer(&self) -> Option<&ContextId> {
        self.peer.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Opens a connection to `target`, replacing any current one.
    pub fn connect(&mut self, target: ContextId) -> Result<(), ChannelError> {
        self.disconnect();
        self.peer = Some(target.clone());
        self.state = ChannelState::Connecting;

        match self.transport.connect(&target, &self.name) {
            Ok(port) => {
                self.port = Some(port);
                self.state = ChannelState::Open;
                tracing::debug!(peer = %target, "channel open");
                Ok(())
            }
            Err(e) => {
                self.state = ChannelState::Closed;
                tracing::warn!(error = %e, peer = %target, "channel connect failed");
                Err(e)
            }
        }
    }

    /// Takes over a connection initiated by `peer`, replacing any current one.
    pub fn adopt(&mut self, port: T::Port, peer: ContextId) {
        self.disconnect();
        tracing::debug!(peer = %peer, "channel adopted");
        self.port = Some(port);
        self.peer = Some(peer);
        self.state = ChannelState::Open;
    }

    pub fn send(&mut self, message: &ChannelMessage) -> Result<(), ChannelError> {
        let raw = encode(message)?;

        if self.state == ChannelState::Open
            && let Some(port) = self.port.as_mut()
        {
            match port.post(&raw) {
                Ok(()) => return Ok(()),
                Err(e) => tracing::debug!(error = %e, "post failed, reconnecting"),
            }
        }

        self.reconnect_and_post(&raw).inspect_err(|e| {
            tracing::warn!(
                error = %e,
                message_type = message.type_name(),
                "message dropped"
            );
        })
    }

    fn reconnect_and_post(&mut self, raw: &str) -> Result<(), ChannelError> {
        let Some(peer) = self.peer.clone() else {
            return Err(ChannelError::NotConnected);
        };

        if let Some(mut old) = self.port.take() {
            old.close();
        }
        self.state = ChannelState::Connecting;

        let dropped = |reason: String| ChannelError::Dropped {
            peer: peer.to_string(),
            reason,
        };

        let mut port = match self.transport.connect(&peer, &self.name) {
            Ok(port) => port,
            Err(e) => {
                self.state = ChannelState::Closed;
                return Err(dropped(e.to_string()));
            }
        };

        let posted = port.post(raw);
        self.port = Some(port);
        self.state = ChannelState::Open;
        tracing::info!(peer = %peer, "channel reconnected");
        posted.map_err(|e| dropped(e.to_string()))
    }

    /// Delivers decoded messages and the disconnect notice, in arrival order.
    pub fn poll(&mut self) -> Vec<ChannelEvent> {
        let Some(port) = self.port.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        for event in port.poll() {
            match event {
                PortEvent::Message(raw) => match decode(&raw) {
                    Decoded::Message(m) => events.push(ChannelEvent::Message(m)),
                    Decoded::Unknown(t) => {
                        tracing::warn!(message_type = %t, "ignoring unknown message type");
                    }
                    Decoded::Malformed(e) => {
                        tracing::warn!(error = %e, "ignoring malformed message");
                    }
                },
                PortEvent::Disconnected => {
                    self.state = ChannelState::Closed;
                    events.push(ChannelEvent::Disconnected);
                }
            }
        }
        events
    }

    /// Closes and discards the port. The peer is remembered for reconnects.
    pub fn disconnect(&mut self) {
        if let Some(mut port) = self.port.take() {
            port.close();
        }
        self.state = ChannelState::Closed;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use tracing_test::traced_test;

    use super::*;
    use crate::domain::ElementRole;

    fn pair() -> (LoopbackHub, Channel<LoopbackTransport>, Channel<LoopbackTransport>) {
        let hub = LoopbackHub::new();
        hub.listen(ContextId::tab(1));
        hub.listen(ContextId::panel());

        let mut panel = Channel::new(hub.transport(ContextId::panel()), CHANNEL_NAME);
        panel.connect(ContextId::tab(1)).unwrap();

        let mut embedded = Channel::new(hub.transport(ContextId::tab(1)), CHANNEL_NAME);
        let incoming = hub.accept(&ContextId::tab(1)).pop().unwrap();
        embedded.adopt(incoming.port, incoming.peer);
        (hub, panel, embedded)
    }

    #[test]
    fn messages_are_decoded_on_poll() {
        let (_hub, mut panel, mut embedded) = pair();
        panel
            .send(&ChannelMessage::StartElementSelection {
                element_type: ElementRole::ChatArea,
            })
            .unwrap();
        assert_eq!(
            embedded.poll(),
            vec![ChannelEvent::Message(ChannelMessage::StartElementSelection {
                element_type: ElementRole::ChatArea,
            })]
        );
    }

    #[test]
    fn connecting_twice_keeps_one_live_link() {
        let (hub, mut panel, _embedded) = pair();
        panel.connect(ContextId::tab(1)).unwrap();
        assert_eq!(hub.open_links(), 1);
    }

    #[traced_test]
    #[test]
    fn unknown_frames_are_logged_and_skipped() {
        let hub = LoopbackHub::new();
        hub.listen(ContextId::tab(1));
        let mut raw = hub
            .transport(ContextId::panel())
            .connect(&ContextId::tab(1), CHANNEL_NAME)
            .unwrap();
        let incoming = hub.accept(&ContextId::tab(1)).pop().unwrap();
        let mut embedded = Channel::new(hub.transport(ContextId::tab(1)), CHANNEL_NAME);
        embedded.adopt(incoming.port, incoming.peer);

        raw.post(r#"{"type":"ping"}"#).unwrap();
        raw.post("{oops").unwrap();
        raw.post(r#"{"type":"sidePanelClosed"}"#).unwrap();

        assert_eq!(
            embedded.poll(),
            vec![ChannelEvent::Message(ChannelMessage::SidePanelClosed)]
        );
        assert!(logs_contain("ignoring unknown message type"));
        assert!(logs_contain("ignoring malformed message"));
    }

    #[test]
    fn peer_disconnect_closes_but_keeps_the_handle() {
        let (_hub, mut panel, mut embedded) = pair();
        panel.disconnect();
        assert_eq!(embedded.poll(), vec![ChannelEvent::Disconnected]);
        assert_eq!(embedded.state(), ChannelState::Closed);
        embedded.disconnect();
        assert!(embedded.poll().is_empty());
    }
}
