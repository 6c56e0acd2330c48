//! Manual calibration: the user points at the chat area and the input area.
//!
//! `TargetingSession` is the only mutator of selection state. While a role is being
//! selected, capturing pointer listeners drive a debounced hover overlay; a click binds
//! the role to the clicked node and leaves selection mode. Confirmed targets keep a
//! permanent highlight that follows their node until the target is replaced or the
//! session is torn down.

use std::{collections::BTreeMap, time::Duration};

use chat_bridge_core::timing::{Debouncer, TimerId};

use super::highlight::HighlightTracker;
use crate::{
    domain::ElementRole,
    errors::HostError,
    host::{
        HostTree, ListenerId, ListenerKind, MutationRecord, NodeId, ObserverId, OverlayId,
        OverlayKind, PointerEvent, PointerKind,
    },
};

/// A confirmed binding of a role to a host node. The node is not owned and may go
/// stale; callers re-validate through [`TargetingSession::live_target`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub role: ElementRole,
    pub node: NodeId,
    pub highlighter: Option<OverlayId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub active: bool,
    pub pending_role: Option<ElementRole>,
    pub confirmed: Vec<ElementRole>,
}

impl SelectionState {
    fn confirm(&mut self, role: ElementRole) {
        if !self.confirmed.contains(&role) {
            self.confirmed.push(role);
        }
    }

    pub fn is_confirmed(&self, role: ElementRole) -> bool {
        self.confirmed.contains(&role)
    }
}

#[derive(Debug)]
pub struct TargetingSession {
    targets: BTreeMap<ElementRole, Target>,
    selection: SelectionState,
    pointer_listeners: Vec<ListenerId>,
    viewport_listeners: Vec<ListenerId>,
    hover_overlay: Option<OverlayId>,
    hover: Debouncer<NodeId>,
    highlights: HighlightTracker,
}

impl TargetingSession {
    pub fn new(hover_quiet: Duration, highlight_quiet: Duration) -> Self {
        Self {
            targets: BTreeMap::new(),
            selection: SelectionState::default(),
            pointer_listeners: Vec::new(),
            viewport_listeners: Vec::new(),
            hover_overlay: None,
            hover: Debouncer::new(hover_quiet),
            highlights: HighlightTracker::new(highlight_quiet),
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_selecting(&self) -> bool {
        self.selection.active
    }

    /// Both roles have been confirmed at least once.
    pub fn is_complete(&self) -> bool {
        ElementRole::ALL
            .iter()
            .all(|r| self.selection.is_confirmed(*r))
    }

    pub fn target(&self, role: ElementRole) -> Option<&Target> {
        self.targets.get(&role)
    }

    /// The role's node if it is still attached to the host tree.
    pub fn live_target<H: HostTree + ?Sized>(&self, host: &H, role: ElementRole) -> Option<NodeId> {
        self.targets
            .get(&role)
            .map(|t| t.node)
            .filter(|n| host.is_attached(*n))
    }

    pub fn start_selection<H: HostTree + ?Sized>(&mut self, host: &mut H, role: ElementRole) {
        if self.selection.active {
            self.cancel_selection(host);
        }

        for kind in [
            ListenerKind::PointerOver,
            ListenerKind::PointerOut,
            ListenerKind::Click,
        ] {
            self.pointer_listeners.push(host.add_listener(kind));
        }
        self.ensure_viewport_listeners(host);

        self.selection.active = true;
        self.selection.pending_role = Some(role);
        tracing::info!(role = role.as_str(), "element selection started");
    }

    /// Leaves selection mode without binding anything.
    pub fn cancel_selection<H: HostTree + ?Sized>(&mut self, host: &mut H) {
        for l in self.pointer_listeners.drain(..) {
            host.remove_listener(l);
        }
        self.hover.cancel(host);
        if let Some(o) = self.hover_overlay.take() {
            host.remove_overlay(o);
        }
        self.selection.active = false;
        self.selection.pending_role = None;
    }

    /// Handles one pointer event. Returns the role confirmed by a click.
    pub fn on_pointer<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        event: PointerEvent,
    ) -> Option<ElementRole> {
        if !self.selection.active {
            return None;
        }

        match event.kind {
            PointerKind::Over => {
                self.hover.call(host, event.target);
                None
            }
            PointerKind::Out => {
                self.hover.cancel(host);
                if let Some(o) = self.hover_overlay {
                    host.place_overlay(o, None);
                }
                None
            }
            PointerKind::Click => {
                host.prevent_default(event.id);
                let role = self.selection.pending_role?;
                let node = match role {
                    ElementRole::InputArea => editable_descendant(host, event.target),
                    ElementRole::ChatArea => event.target,
                };

                if let Err(e) = self.bind(host, role, node) {
                    tracing::warn!(error = ?e, role = role.as_str(), "click target rejected");
                    return None;
                }
                self.cancel_selection(host);
                Some(role)
            }
        }
    }

    /// Binds `role` to `node`, replacing the previous target and its highlighter.
    pub fn bind<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        role: ElementRole,
        node: NodeId,
    ) -> Result<(), HostError> {
        if !host.is_attached(node) {
            return Err(HostError::Detached(node));
        }

        self.clear_target(host, role);

        let overlay = host.create_overlay(OverlayKind::Highlight(role));
        if let Err(e) = self.highlights.track(host, node, overlay) {
            host.remove_overlay(overlay);
            return Err(e);
        }
        self.ensure_viewport_listeners(host);

        self.targets.insert(
            role,
            Target {
                role,
                node,
                highlighter: Some(overlay),
            },
        );
        self.selection.confirm(role);
        tracing::info!(role = role.as_str(), ?node, "target bound");
        Ok(())
    }

    /// Forgets the role's target. Its confirmation is withdrawn too.
    pub fn clear_target<H: HostTree + ?Sized>(&mut self, host: &mut H, role: ElementRole) {
        if let Some(old) = self.targets.remove(&role)
            && let Some(o) = old.highlighter
        {
            self.highlights.untrack(host, o);
        }
        self.selection.confirmed.retain(|r| *r != role);
    }

    pub fn on_timer<H: HostTree + ?Sized>(&mut self, host: &mut H, id: TimerId) -> bool {
        if let Some(node) = self.hover.fire(id) {
            let overlay = match self.hover_overlay {
                Some(o) => o,
                None => {
                    let o = host.create_overlay(OverlayKind::Hover);
                    self.hover_overlay = Some(o);
                    o
                }
            };
            let rect = host.bounding_rect(node);
            host.place_overlay(overlay, rect);
            return true;
        }
        self.highlights.on_timer(host, id)
    }

    pub fn on_mutations<H: HostTree + ?Sized>(
        &mut self,
        host: &mut H,
        observer: ObserverId,
        records: &[MutationRecord],
    ) -> bool {
        self.highlights.on_mutations(host, observer, records)
    }

    /// Resize or scroll: every highlighter follows immediately.
    pub fn on_viewport<H: HostTree + ?Sized>(&mut self, host: &mut H) {
        self.highlights.reposition_all(host);
    }

    pub fn teardown<H: HostTree + ?Sized>(&mut self, host: &mut H) {
        self.cancel_selection(host);
        self.highlights.clear(host);
        for l in self.viewport_listeners.drain(..) {
            host.remove_listener(l);
        }
        self.targets.clear();
        self.selection = SelectionState::default();
    }

    fn ensure_viewport_listeners<H: HostTree + ?Sized>(&mut self, host: &mut H) {
        if self.viewport_listeners.is_empty() {
            self.viewport_listeners
                .push(host.add_listener(ListenerKind::Resize));
            self.viewport_listeners
                .push(host.add_listener(ListenerKind::Scroll));
        }
    }
}

/// First editable node at or below `node`, depth-first. Falls back to `node`.
fn editable_descendant<H: HostTree + ?Sized>(host: &H, node: NodeId) -> NodeId {
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        if host.describe(id).is_some_and(|i| i.is_editable()) {
            return id;
        }
        stack.extend(host.children(id).into_iter().rev());
    }
    node
}
