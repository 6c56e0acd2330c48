//! In-memory host page.
//!
//! `MemoryTree` is a small element tree with the notification behaviour of a browser
//! document: mutation observers receive batched records, pointer events are only
//! delivered while a matching listener is installed, and timers run on a virtual clock.
//! Tests and the demo binary drive it directly.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    time::Duration,
};

use chat_bridge_core::timing::{TimerId, TimerQueue, Timers};

use super::{
    EventId, HostEvent, HostTree, ListenerId, ListenerKind, MutationKind, MutationRecord, NodeId,
    NodeInfo, ObserveOptions, ObserverId, OverlayId, OverlayKind, PointerEvent, PointerKind,
    RectI, ViewportChange,
};
use crate::errors::HostError;

/// Description of an element to insert.
#[derive(Clone, Debug, Default)]
pub struct ElementSpec {
    info: NodeInfo,
    text: String,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            info: NodeInfo {
                tag: tag.to_ascii_lowercase(),
                ..Default::default()
            },
            text: String::new(),
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.info.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.info
            .attributes
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn rect(mut self, rect: RectI) -> Self {
        self.info.rect = rect;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.info.fixed_or_sticky = true;
        self
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.info.z_index = z;
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.info.scrollable = true;
        self
    }

    pub fn overflow(mut self) -> Self {
        self.info.overflow_auto = true;
        self
    }

    pub fn flex(mut self) -> Self {
        self.info.flex_or_grid = true;
        self
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    info: NodeInfo,
    text: String,
    value: String,
    attached: bool,
}

#[derive(Debug)]
struct Observer {
    node: NodeId,
    options: ObserveOptions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayState {
    pub kind: OverlayKind,
    pub rect: Option<RectI>,
}

#[derive(Debug)]
pub struct MemoryTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    viewport: RectI,
    timers: TimerQueue,
    observers: BTreeMap<ObserverId, Observer>,
    pending_records: BTreeMap<ObserverId, Vec<MutationRecord>>,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    overlays: BTreeMap<OverlayId, OverlayState>,
    queue: VecDeque<HostEvent>,
    hovered: Option<NodeId>,
    prevented: HashSet<EventId>,
    input_events: Vec<NodeId>,
}

impl MemoryTree {
    pub fn new(viewport: RectI) -> Self {
        let root = NodeId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                parent: None,
                children: Vec::new(),
                info: NodeInfo {
                    tag: "body".to_string(),
                    rect: viewport,
                    ..Default::default()
                },
                text: String::new(),
                value: String::new(),
                attached: true,
            },
        );

        Self {
            nodes,
            root,
            next_id: 1,
            viewport,
            timers: TimerQueue::new(),
            observers: BTreeMap::new(),
            pending_records: BTreeMap::new(),
            listeners: BTreeMap::new(),
            overlays: BTreeMap::new(),
            queue: VecDeque::new(),
            hovered: None,
            prevented: HashSet::new(),
            input_events: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn append_child(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let id = NodeId(self.next());
        let attached = self.is_attached(parent);
        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                children: Vec::new(),
                info: spec.info,
                text: spec.text,
                value: String::new(),
                attached,
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        self.record(parent, MutationKind::ChildList, None);
        id
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = text.to_string();
            self.record(node, MutationKind::CharacterData, None);
        }
    }

    pub fn append_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text.push_str(text);
            self.record(node, MutationKind::CharacterData, None);
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(n) = self.nodes.get_mut(&node) else {
            return;
        };
        match n.info.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => n
                .info
                .attributes
                .push((name.to_string(), value.to_string())),
        }
        self.record(node, MutationKind::Attributes, Some(name.to_string()));
    }

    pub fn set_rect(&mut self, node: NodeId, rect: RectI) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.info.rect = rect;
        }
    }

    /// Detaches `node` and its subtree.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != node);
        }
        self.record(parent, MutationKind::ChildList, None);

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.get_mut(&id) {
                n.attached = false;
                stack.extend(n.children.iter().copied());
            }
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = None;
        }
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.value.as_str())
    }

    pub fn input_events(&self) -> &[NodeId] {
        &self.input_events
    }

    /// Moves the pointer onto `node`, emitting pointer-out for the previous node.
    pub fn hover(&mut self, node: NodeId) {
        if let Some(prev) = self.hovered.replace(node)
            && prev != node
        {
            self.pointer(PointerKind::Out, ListenerKind::PointerOut, prev);
        }
        self.pointer(PointerKind::Over, ListenerKind::PointerOver, node);
    }

    /// Moves the pointer off the page, emitting pointer-out for the hovered node.
    pub fn leave(&mut self) {
        if let Some(prev) = self.hovered.take() {
            self.pointer(PointerKind::Out, ListenerKind::PointerOut, prev);
        }
    }

    /// Clicks `node`. Returns the event id when a click listener received it.
    pub fn click(&mut self, node: NodeId) -> Option<EventId> {
        self.pointer(PointerKind::Click, ListenerKind::Click, node)
    }

    fn pointer(&mut self, kind: PointerKind, slot: ListenerKind, target: NodeId) -> Option<EventId> {
        if !self.has_listener(slot) {
            return None;
        }
        let id = EventId(self.next());
        self.queue
            .push_back(HostEvent::Pointer(PointerEvent { id, kind, target }));
        Some(id)
    }

    pub fn was_prevented(&self, event: EventId) -> bool {
        self.prevented.contains(&event)
    }

    pub fn resize(&mut self, viewport: RectI) {
        self.viewport = viewport;
        if self.has_listener(ListenerKind::Resize) {
            self.queue
                .push_back(HostEvent::Viewport(ViewportChange::Resize));
        }
    }

    /// Scrolls the document by `dy` pixels, shifting every element box.
    pub fn scroll_by(&mut self, dy: i32) {
        for n in self.nodes.values_mut() {
            n.info.rect = n.info.rect.translated(0, -dy);
        }
        if self.has_listener(ListenerKind::Scroll) {
            self.queue
                .push_back(HostEvent::Viewport(ViewportChange::Scroll));
        }
    }

    pub fn unload(&mut self) {
        self.queue.push_back(HostEvent::Unload);
    }

    /// Drains queued input events followed by one mutation batch per observer.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        let mut events: Vec<HostEvent> = self.queue.drain(..).collect();
        let batches = std::mem::take(&mut self.pending_records);
        events.extend(
            batches
                .into_iter()
                .filter(|(_, records)| !records.is_empty())
                .map(|(observer, records)| HostEvent::Mutations { observer, records }),
        );
        events
    }

    /// Advances the virtual clock and returns the timers that fired.
    pub fn advance(&mut self, delta: Duration) -> Vec<HostEvent> {
        self.timers
            .advance_by(delta)
            .into_iter()
            .map(HostEvent::Timer)
            .collect()
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn has_listener(&self, kind: ListenerKind) -> bool {
        self.listeners.values().any(|k| *k == kind)
    }

    pub fn overlay(&self, overlay: OverlayId) -> Option<OverlayState> {
        self.overlays.get(&overlay).copied()
    }

    pub fn overlays(&self) -> impl Iterator<Item = (OverlayId, OverlayState)> + '_ {
        self.overlays.iter().map(|(id, s)| (*id, *s))
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.nodes.get(&node).and_then(|n| n.parent);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn record(&mut self, target: NodeId, kind: MutationKind, attribute: Option<String>) {
        let matching: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|(_, o)| o.options.accepts(kind))
            .filter(|(_, o)| o.node == target || (o.options.subtree && self.is_ancestor(o.node, target)))
            .map(|(id, _)| *id)
            .collect();

        for id in matching {
            self.pending_records
                .entry(id)
                .or_default()
                .push(MutationRecord {
                    target,
                    kind,
                    attribute: attribute.clone(),
                });
        }
    }

    fn text_of(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        out.push_str(&n.text);
        for child in &n.children {
            self.text_of(*child, out);
        }
    }
}

impl Timers for MemoryTree {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.timers.set_timeout(delay)
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.clear_timeout(id);
    }
}

impl HostTree for MemoryTree {
    fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.attached)
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        if !self.nodes.contains_key(&node) {
            return None;
        }
        let mut out = String::new();
        self.text_of(node, &mut out);
        Some(out)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn describe(&self, node: NodeId) -> Option<NodeInfo> {
        self.nodes.get(&node).map(|n| n.info.clone())
    }

    fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(n) = self.nodes.get(&id) else {
                continue;
            };
            if !n.attached {
                continue;
            }
            out.push(id);
            stack.extend(n.children.iter().rev().copied());
        }
        out
    }

    fn bounding_rect(&self, node: NodeId) -> Option<RectI> {
        self.nodes
            .get(&node)
            .filter(|n| n.attached)
            .map(|n| n.info.rect)
    }

    fn viewport(&self) -> RectI {
        self.viewport
    }

    fn set_value(&mut self, node: NodeId, text: &str) -> Result<(), HostError> {
        let n = self
            .nodes
            .get_mut(&node)
            .filter(|n| n.attached)
            .ok_or(HostError::Detached(node))?;

        let form_control = matches!(n.info.tag.as_str(), "textarea" | "input");
        if !form_control && !n.info.is_editable() {
            return Err(HostError::NotEditable(node));
        }

        n.value = text.to_string();
        if !form_control {
            n.text = text.to_string();
            self.record(node, MutationKind::CharacterData, None);
        }
        Ok(())
    }

    fn dispatch_input_event(&mut self, node: NodeId) -> Result<(), HostError> {
        if !self.is_attached(node) {
            return Err(HostError::Detached(node));
        }
        self.input_events.push(node);
        Ok(())
    }

    fn observe(
        &mut self,
        node: NodeId,
        options: ObserveOptions,
    ) -> Result<ObserverId, HostError> {
        if !self.is_attached(node) {
            return Err(HostError::Detached(node));
        }
        let id = ObserverId(self.next());
        self.observers.insert(id, Observer { node, options });
        Ok(id)
    }

    fn disconnect(&mut self, observer: ObserverId) {
        self.observers.remove(&observer);
        self.pending_records.remove(&observer);
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next());
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn prevent_default(&mut self, event: EventId) {
        self.prevented.insert(event);
    }

    fn create_overlay(&mut self, kind: OverlayKind) -> OverlayId {
        let id = OverlayId(self.next());
        self.overlays.insert(id, OverlayState { kind, rect: None });
        id
    }

    fn place_overlay(&mut self, overlay: OverlayId, rect: Option<RectI>) {
        if let Some(o) = self.overlays.get_mut(&overlay) {
            o.rect = rect;
        }
    }

    fn remove_overlay(&mut self, overlay: OverlayId) {
        self.overlays.remove(&overlay);
    }
}
