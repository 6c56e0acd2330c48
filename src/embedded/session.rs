//! Embedded-side session.
//!
//! `ContentSession` owns everything the embedded side keeps between events: the
//! channel, the diff baseline, the conversation history, targeting, the region watcher
//! and the detector. Host events and channel events are handed to it by the driver;
//! every exit path funnels into [`ContentSession::teardown`].

use chat_bridge_core::text::Baseline;

use super::{
    detection::RegionDetector, injection::InjectionWriter, targeting::TargetingSession,
    watcher::RegionWatcher,
};
use crate::{
    channel::{CHANNEL_NAME, Channel, ChannelEvent, ContextId, Transport},
    config::Timing,
    domain::{ActionOutcome, ChannelMessage, ElementRole, Failure, SessionHistory, SkipReason},
    host::{HostEvent, HostTree, NodeId},
};

pub struct ContentSession<T: Transport> {
    channel: Channel<T>,
    baseline: Baseline,
    history: SessionHistory,
    targeting: TargetingSession,
    watcher: RegionWatcher,
    detector: Box<dyn RegionDetector>,
    writer: InjectionWriter,
    tab: Option<u32>,
}

impl<T: Transport> ContentSession<T> {
    pub fn new(transport: T, timing: &Timing, detector: Box<dyn RegionDetector>) -> Self {
        Self {
            channel: Channel::new(transport, CHANNEL_NAME),
            baseline: Baseline::new(),
            history: SessionHistory::new(),
            targeting: TargetingSession::new(timing.hover_debounce(), timing.highlight_debounce()),
            watcher: RegionWatcher::new(timing.watch_debounce()),
            detector,
            writer: InjectionWriter,
            tab: None,
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn targeting(&self) -> &TargetingSession {
        &self.targeting
    }

    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    pub fn watched_node(&self) -> Option<NodeId> {
        self.watcher.node()
    }

    pub fn tab(&self) -> Option<u32> {
        self.tab
    }

    /// Takes over a connection opened by the side panel.
    pub fn accept(&mut self, port: T::Port, peer: ContextId) {
        self.channel.adopt(port, peer);
    }

    pub fn poll_channel<H: HostTree>(&mut self, host: &mut H) {
        for event in self.channel.poll() {
            match event {
                ChannelEvent::Message(message) => self.dispatch(host, message),
                ChannelEvent::Disconnected => {
                    tracing::info!("side panel disconnected");
                    self.teardown(host);
                    self.channel.disconnect();
                }
            }
        }
    }

    pub fn dispatch<H: HostTree>(&mut self, host: &mut H, message: ChannelMessage) {
        tracing::debug!(message_type = message.type_name(), "message received");
        match message {
            ChannelMessage::SidePanelOpened { tab_id } => {
                self.teardown(host);
                self.baseline.reset();
                self.history.clear();
                self.tab = Some(tab_id);
                self.auto_target(host);
            }
            ChannelMessage::SidePanelClosed => {
                self.teardown(host);
                self.channel.disconnect();
            }
            ChannelMessage::StartElementSelection { element_type } => {
                self.targeting.start_selection(host, element_type);
            }
            ChannelMessage::InjectTextIntoChat {
                text,
                original_text,
                partner_translation,
            } => {
                let outcome = self.inject(
                    host,
                    &text,
                    original_text.as_deref(),
                    partner_translation.as_deref(),
                );
                tracing::debug!(outcome = ?outcome, "inject handled");
            }
            other => {
                tracing::warn!(
                    message_type = other.type_name(),
                    "ignoring message not meant for the page"
                );
            }
        }
    }

    pub fn handle_host_event<H: HostTree>(&mut self, host: &mut H, event: HostEvent) {
        match event {
            HostEvent::Mutations { observer, records } => {
                if !self.watcher.on_mutations(host, observer, &records) {
                    self.targeting.on_mutations(host, observer, &records);
                }
            }
            HostEvent::Timer(id) => {
                if self.watcher.owns_timer(id) {
                    if let Some(delta) = self.watcher.on_timer(host, id, &mut self.baseline) {
                        self.emit_remote(&delta);
                    }
                } else {
                    self.targeting.on_timer(host, id);
                }
            }
            HostEvent::Pointer(event) => {
                if let Some(role) = self.targeting.on_pointer(host, event) {
                    self.on_role_confirmed(host, role);
                }
            }
            HostEvent::Viewport(_) => self.targeting.on_viewport(host),
            HostEvent::Unload => {
                self.send(ChannelMessage::CloseSidePanel);
                self.teardown(host);
                self.channel.disconnect();
            }
        }
    }

    /// Writes a reply into the input target and records the exchange.
    ///
    /// A missing or detached input target is cleared and re-targeted; the reply is
    /// dropped in that case.
    pub fn inject<H: HostTree>(
        &mut self,
        host: &mut H,
        text: &str,
        original_text: Option<&str>,
        partner_translation: Option<&str>,
    ) -> ActionOutcome {
        let input = self.targeting.live_target(host, ElementRole::InputArea);
        let chat = self.targeting.live_target(host, ElementRole::ChatArea);

        let outcome = self
            .writer
            .inject(host, input, chat, text, &mut self.baseline);

        match outcome {
            ActionOutcome::Applied => {
                self.history
                    .record_exchange(partner_translation, original_text.unwrap_or(text), text);
            }
            ActionOutcome::Skipped(SkipReason::NoInputTarget)
            | ActionOutcome::Failed(Failure::TargetDetached) => {
                tracing::warn!(reason = ?outcome, "input target missing, reply dropped");
                self.retarget_input(host);
            }
            ActionOutcome::Skipped(reason) => {
                tracing::debug!(reason = reason.as_str(), "inject skipped");
            }
            ActionOutcome::Failed(failure) => {
                tracing::warn!(failure = failure.as_str(), "inject failed");
            }
        }
        outcome
    }

    /// Releases every observer, listener, overlay and timer held in the host.
    /// Safe to call any number of times.
    pub fn teardown<H: HostTree>(&mut self, host: &mut H) {
        self.watcher.stop(host);
        self.targeting.teardown(host);
        self.baseline.reset();
    }

    fn auto_target<H: HostTree>(&mut self, host: &mut H) {
        let Some(found) = self.detector.detect_regions(&*host) else {
            tracing::info!("no chat regions detected, waiting for manual selection");
            return;
        };

        for (role, node) in [
            (ElementRole::ChatArea, found.chat_area),
            (ElementRole::InputArea, found.input_area),
        ] {
            let Some(node) = node else {
                continue;
            };
            match self.targeting.bind(host, role, node) {
                Ok(()) => self.on_role_confirmed(host, role),
                Err(e) => tracing::warn!(error = %e, role = role.as_str(), "detected target rejected"),
            }
        }
    }

    fn retarget_input<H: HostTree>(&mut self, host: &mut H) {
        self.targeting.clear_target(host, ElementRole::InputArea);

        let detected = self
            .detector
            .detect_regions(&*host)
            .and_then(|found| found.input_area);
        if let Some(node) = detected
            && self
                .targeting
                .bind(host, ElementRole::InputArea, node)
                .is_ok()
        {
            self.on_role_confirmed(host, ElementRole::InputArea);
            return;
        }

        self.targeting.start_selection(host, ElementRole::InputArea);
    }

    fn on_role_confirmed<H: HostTree>(&mut self, host: &mut H, role: ElementRole) {
        self.send(ChannelMessage::ElementSelected { element_type: role });

        if role == ElementRole::ChatArea
            && let Some(node) = self.targeting.target(role).map(|t| t.node)
        {
            self.start_watching(host, node);
        }
    }

    fn start_watching<H: HostTree>(&mut self, host: &mut H, node: NodeId) {
        self.watcher.stop(host);
        self.baseline.reset();

        match self.watcher.start(host, node, &mut self.baseline) {
            Ok(initial) if !initial.is_empty() => self.emit_remote(&initial),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "could not watch chat region"),
        }
    }

    fn emit_remote(&mut self, delta: &str) {
        self.history.record_remote(delta);
        self.send(ChannelMessage::ChatMessageDetected {
            text: delta.to_string(),
        });
    }

    fn send(&mut self, message: ChannelMessage) {
        if let Err(e) = self.channel.send(&message) {
            tracing::debug!(error = %e, message_type = message.type_name(), "send failed");
        }
    }
}
