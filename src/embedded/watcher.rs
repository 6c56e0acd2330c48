use std::time::Duration;

use chat_bridge_core::{
    text::{Baseline, compute_delta},
    timing::{Debouncer, TimerId},
};

use crate::{
    errors::HostError,
    host::{HostTree, MutationRecord, NodeId, ObserveOptions, ObserverId},
};

/// Turns mutations of one chat region into settled "new remote text" deltas.
///
/// The baseline is owned by the caller; the watcher only reads and advances it.
#[derive(Debug)]
pub struct RegionWatcher {
    node: Option<NodeId>,
    observer: Option<ObserverId>,
    settle: Debouncer<()>,
}

impl RegionWatcher {
    pub fn new(quiet: Duration) -> Self {
        Self {
            node: None,
            observer: None,
            settle: Debouncer::new(quiet),
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn is_watching(&self) -> bool {
        self.observer.is_some()
    }

    /// Starts watching `node`. Returns the text already present, measured against a
    /// fresh baseline.
    pub fn start<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        node: NodeId,
        baseline: &mut Baseline,
    ) -> Result<String, HostError> {
        self.stop(host);
        if !host.is_attached(node) {
            return Err(HostError::Detached(node));
        }

        baseline.reset();
        let text = host.text_content(node).unwrap_or_default();
        let delta = compute_delta(&text, baseline);
        *baseline = delta.baseline;

        self.observer = Some(host.observe(node, ObserveOptions::CONTENT)?);
        self.node = Some(node);
        tracing::debug!(?node, initial_len = text.len(), "watching chat region");
        Ok(delta.text)
    }

    /// Feeds one mutation batch. Returns `false` when the batch belongs to another
    /// observer.
    pub fn on_mutations<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        observer: ObserverId,
        records: &[MutationRecord],
    ) -> bool {
        if self.observer != Some(observer) {
            return false;
        }
        if records.iter().any(MutationRecord::is_content_change) {
            self.settle.call(host, ());
        }
        true
    }

    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.settle.owns(id)
    }

    /// Handles the settle timer. Yields the non-empty delta, if any.
    ///
    /// A region that was detached in the meantime stops the watcher without emitting.
    pub fn on_timer<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        id: TimerId,
        baseline: &mut Baseline,
    ) -> Option<String> {
        self.settle.fire(id)?;
        let node = self.node?;

        if !host.is_attached(node) {
            tracing::debug!(?node, "chat region detached, watcher stopped");
            self.stop(host);
            return None;
        }

        let text = host.text_content(node).unwrap_or_default();
        let delta = compute_delta(&text, baseline);
        tracing::trace!(
            kind = delta.kind.as_str(),
            observed_len = delta.baseline.observed_len,
            "chat region settled"
        );
        *baseline = delta.baseline;

        if delta.text.is_empty() {
            None
        } else {
            Some(delta.text)
        }
    }

    pub fn stop<H: HostTree + ?Sized>(&mut self, host: &mut H) {
        if let Some(observer) = self.observer.take() {
            host.disconnect(observer);
        }
        self.settle.cancel(host);
        self.node = None;
    }
}
