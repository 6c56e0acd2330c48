#![allow(clippy::unwrap_used, clippy::expect_used)]

mod config_io_tests;
mod end_to_end_tests;
mod targeting_tests;

use std::time::Duration;

use crate::{
    channel::{
        ContextId, LoopbackHub, LoopbackPort, LoopbackTransport, Port, PortEvent, Transport,
    },
    config::Timing,
    domain::{ChannelMessage, Decoded, ElementRole, decode, encode},
    embedded::{ContentSession, ManualOnly, RegionDetector},
    host::{ElementSpec, HostTree, MemoryTree, NodeId, RectI},
};

pub const TAB: u32 = 4;
pub const WATCH: Duration = Duration::from_millis(500);

/// Embedded session on a small chat page, driven from a raw panel port.
pub struct PageFixture {
    pub hub: LoopbackHub,
    pub host: MemoryTree,
    pub session: ContentSession<LoopbackTransport>,
    pub panel: LoopbackPort,
    pub chat: NodeId,
    pub input: NodeId,
    pub composer: NodeId,
}

impl PageFixture {
    pub fn new() -> Self {
        Self::with_detector(Box::new(ManualOnly))
    }

    pub fn with_detector(detector: Box<dyn RegionDetector>) -> Self {
        let mut host = MemoryTree::new(RectI::new(0, 0, 800, 600));
        let root = host.root();
        let chat = host.append_child(
            root,
            ElementSpec::new("div")
                .class("message-list")
                .attr("role", "log")
                .attr("aria-live", "polite")
                .scrollable()
                .rect(RectI::new(0, 0, 800, 500)),
        );
        let composer = host.append_child(
            root,
            ElementSpec::new("footer").rect(RectI::new(0, 520, 800, 80)),
        );
        let input = host.append_child(
            composer,
            ElementSpec::new("textarea")
                .class("composer-input")
                .rect(RectI::new(10, 530, 780, 60)),
        );
        host.take_events();

        let hub = LoopbackHub::new();
        hub.listen(ContextId::tab(TAB));
        hub.listen(ContextId::panel());

        let mut session = ContentSession::new(
            hub.transport(ContextId::tab(TAB)),
            &Timing::default(),
            detector,
        );
        let panel = hub
            .transport(ContextId::panel())
            .connect(&ContextId::tab(TAB), crate::channel::CHANNEL_NAME)
            .unwrap();
        let incoming = hub.accept(&ContextId::tab(TAB)).pop().unwrap();
        session.accept(incoming.port, incoming.peer);

        Self {
            hub,
            host,
            session,
            panel,
            chat,
            input,
            composer,
        }
    }

    /// Sends `message` from the panel and lets the session handle it.
    pub fn send(&mut self, message: ChannelMessage) {
        self.panel.post(&encode(&message).unwrap()).unwrap();
        self.session.poll_channel(&mut self.host);
        self.pump(Duration::ZERO);
    }

    pub fn open(&mut self) {
        self.send(ChannelMessage::SidePanelOpened { tab_id: TAB });
    }

    /// Delivers pending host notifications, then lets `delta` of virtual time pass.
    pub fn pump(&mut self, delta: Duration) {
        for event in self.host.take_events() {
            self.session.handle_host_event(&mut self.host, event);
        }
        for event in self.host.advance(delta) {
            self.session.handle_host_event(&mut self.host, event);
        }
        for event in self.host.take_events() {
            self.session.handle_host_event(&mut self.host, event);
        }
    }

    pub fn click(&mut self, node: NodeId) {
        self.host.click(node);
        self.pump(Duration::ZERO);
    }

    /// Manual calibration of both roles.
    pub fn select_both(&mut self) {
        self.send(ChannelMessage::StartElementSelection {
            element_type: ElementRole::ChatArea,
        });
        self.click(self.chat);
        self.send(ChannelMessage::StartElementSelection {
            element_type: ElementRole::InputArea,
        });
        self.click(self.composer);
    }

    /// Messages the session sent to the panel since the last call.
    pub fn received(&mut self) -> Vec<ChannelMessage> {
        self.panel
            .poll()
            .into_iter()
            .filter_map(|e| match e {
                PortEvent::Message(raw) => match decode(&raw) {
                    Decoded::Message(m) => Some(m),
                    _ => None,
                },
                PortEvent::Disconnected => None,
            })
            .collect()
    }

    pub fn detected_texts(&mut self) -> Vec<String> {
        self.received()
            .into_iter()
            .filter_map(|m| match m {
                ChannelMessage::ChatMessageDetected { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Nothing the session installed is left in the host.
    pub fn assert_host_clean(&self) {
        assert_eq!(self.host.observer_count(), 0, "observers left behind");
        assert_eq!(self.host.listener_count(), 0, "listeners left behind");
        assert_eq!(self.host.overlay_count(), 0, "overlays left behind");
        assert_eq!(self.host.pending_timers(), 0, "timers left behind");
    }

    pub fn chat_text(&self) -> String {
        self.host.text_content(self.chat).unwrap_or_default()
    }
}
