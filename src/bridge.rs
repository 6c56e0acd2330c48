//! Both halves wired together in one process over a [`LoopbackHub`].
//!
//! The demo binary and the scenario tests drive a `LocalBridge` in fixed ticks: each
//! tick hands over new connections, delivers channel frames and host notifications, and
//! advances both virtual clocks.

use std::time::Duration;

use crate::{
    channel::{ContextId, LoopbackHub, LoopbackTransport},
    config::{SettingsStore, Timing},
    embedded::{ContentSession, RegionDetector},
    host::MemoryTree,
    panel::{SidePanel, TranslationBackend},
};

pub const TICK: Duration = Duration::from_millis(10);

pub struct LocalBridge<B: TranslationBackend, S: SettingsStore> {
    pub hub: LoopbackHub,
    pub page: MemoryTree,
    pub session: ContentSession<LoopbackTransport>,
    pub panel: SidePanel<LoopbackTransport, B, S>,
    tab: u32,
}

impl<B: TranslationBackend, S: SettingsStore> LocalBridge<B, S> {
    pub fn new(
        page: MemoryTree,
        tab: u32,
        timing: &Timing,
        detector: Box<dyn RegionDetector>,
        backend: B,
        store: S,
    ) -> Self {
        let hub = LoopbackHub::new();
        hub.listen(ContextId::tab(tab));
        hub.listen(ContextId::panel());

        Self {
            session: ContentSession::new(hub.transport(ContextId::tab(tab)), timing, detector),
            panel: SidePanel::new(hub.transport(ContextId::panel()), backend, store, timing),
            hub,
            page,
            tab,
        }
    }

    pub fn tab(&self) -> u32 {
        self.tab
    }

    /// One tick of both event loops.
    pub fn step(&mut self, delta: Duration) {
        for incoming in self.hub.accept(&ContextId::tab(self.tab)) {
            self.session.accept(incoming.port, incoming.peer);
        }
        for incoming in self.hub.accept(&ContextId::panel()) {
            self.panel.adopt(incoming.port, incoming.peer);
        }

        self.session.poll_channel(&mut self.page);
        for event in self.page.take_events() {
            self.session.handle_host_event(&mut self.page, event);
        }
        for event in self.page.advance(delta) {
            self.session.handle_host_event(&mut self.page, event);
        }

        self.panel.poll();
        self.panel.advance(delta);
    }

    /// Runs ticks until `total` virtual time has passed.
    pub fn run_for(&mut self, total: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            self.step(TICK);
            elapsed += TICK;
        }
        // Deliver whatever the last tick produced.
        self.step(Duration::ZERO);
    }
}
