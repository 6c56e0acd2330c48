use std::{collections::BTreeMap, time::Duration};

use chat_bridge_core::timing::{Debouncer, TimerId};

use crate::{
    errors::HostError,
    host::{HostTree, MutationRecord, NodeId, ObserveOptions, ObserverId, OverlayId},
};

#[derive(Debug)]
struct Subscription {
    observer: ObserverId,
    overlays: Vec<OverlayId>,
}

/// Keeps permanent highlight overlays glued to their reference nodes.
///
/// Overlays over the same node share one mutation subscription. Content or layout
/// changes reposition every overlay after a short quiet period; viewport changes
/// reposition immediately through [`HighlightTracker::reposition_all`].
#[derive(Debug)]
pub struct HighlightTracker {
    subscriptions: BTreeMap<NodeId, Subscription>,
    reposition: Debouncer<()>,
}

impl HighlightTracker {
    pub fn new(quiet: Duration) -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            reposition: Debouncer::new(quiet),
        }
    }

    pub fn track<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        node: NodeId,
        overlay: OverlayId,
    ) -> Result<(), HostError> {
        if let Some(sub) = self.subscriptions.get_mut(&node) {
            sub.overlays.push(overlay);
        } else {
            let observer = host.observe(node, ObserveOptions::LAYOUT)?;
            self.subscriptions.insert(
                node,
                Subscription {
                    observer,
                    overlays: vec![overlay],
                },
            );
        }
        let rect = host.bounding_rect(node);
        host.place_overlay(overlay, rect);
        Ok(())
    }

    /// Removes `overlay` and drops its node's subscription once no overlay uses it.
    pub fn untrack<H: HostTree + ?Sized>(&mut self, host: &mut H, overlay: OverlayId) {
        host.remove_overlay(overlay);

        let Some(node) = self
            .subscriptions
            .iter()
            .find(|(_, s)| s.overlays.contains(&overlay))
            .map(|(n, _)| *n)
        else {
            return;
        };

        if let Some(sub) = self.subscriptions.get_mut(&node) {
            sub.overlays.retain(|o| *o != overlay);
            if sub.overlays.is_empty() {
                host.disconnect(sub.observer);
                self.subscriptions.remove(&node);
            }
        }

        if self.subscriptions.is_empty() {
            self.reposition.cancel(host);
        }
    }

    pub fn on_mutations<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        observer: ObserverId,
        _records: &[MutationRecord],
    ) -> bool {
        if !self.subscriptions.values().any(|s| s.observer == observer) {
            return false;
        }
        self.reposition.call(host, ());
        true
    }

    pub fn on_timer<H: HostTree + ?Sized>(&mut self, host: &mut H, id: TimerId) -> bool {
        if self.reposition.fire(id).is_none() {
            return false;
        }
        self.reposition_all(host);
        true
    }

    /// Moves every overlay onto its node's current box. Overlays of detached nodes are
    /// hidden.
    pub fn reposition_all<H: HostTree + ?Sized>(&self, host: &mut H) {
        for (node, sub) in &self.subscriptions {
            let rect = host.bounding_rect(*node);
            for overlay in &sub.overlays {
                host.place_overlay(*overlay, rect);
            }
        }
    }

    pub fn clear<H: HostTree + ?Sized>(&mut self, host: &mut H) {
        for (_, sub) in std::mem::take(&mut self.subscriptions) {
            host.disconnect(sub.observer);
            for overlay in sub.overlays {
                host.remove_overlay(overlay);
            }
        }
        self.reposition.cancel(host);
    }

    pub fn overlay_count(&self) -> usize {
        self.subscriptions.values().map(|s| s.overlays.len()).sum()
    }
}
