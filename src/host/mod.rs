//! Abstraction over the externally owned UI tree the embedded side lives in.
//!
//! Everything here is a non-owning view: node ids may go stale at any moment and must be
//! re-validated with [`HostTree::is_attached`] before use. Notifications (mutations,
//! timers, pointer input, viewport changes) are delivered to the session as
//! [`HostEvent`]s by whatever drives the host's event loop.

pub mod geom;
pub mod memory;

pub use geom::RectI;
pub use memory::{ElementSpec, MemoryTree};

use chat_bridge_core::timing::{TimerId, Timers};

use crate::{domain::ElementRole, errors::HostError};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// Static facts about an element used by region detection and input descent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeInfo {
    /// Lowercase tag name.
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub rect: RectI,
    pub fixed_or_sticky: bool,
    pub z_index: i32,
    /// Vertical overflow is `auto`/`scroll` and content is taller than the box.
    pub scrollable: bool,
    /// The `overflow` shorthand is `auto` or `scroll`.
    pub overflow_auto: bool,
    pub flex_or_grid: bool,
}

impl NodeInfo {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Whether the element accepts typed text.
    pub fn is_editable(&self) -> bool {
        match self.tag.as_str() {
            "textarea" => true,
            "input" => matches!(self.attr("type"), None | Some("text" | "search")),
            _ => {
                self.attr("contenteditable") == Some("true") || self.attr("role") == Some("textbox")
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
    pub attribute: Option<String>,
}

impl MutationRecord {
    pub fn is_content_change(&self) -> bool {
        matches!(
            self.kind,
            MutationKind::ChildList | MutationKind::CharacterData
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    /// Text-bearing changes anywhere below the node.
    pub const CONTENT: Self = Self {
        child_list: true,
        character_data: true,
        attributes: false,
        subtree: true,
    };

    /// Anything that may move or resize the node's box.
    pub const LAYOUT: Self = Self {
        child_list: true,
        character_data: true,
        attributes: true,
        subtree: true,
    };

    pub fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::CharacterData => self.character_data,
            MutationKind::Attributes => self.attributes,
        }
    }
}

/// Listener slots. Pointer listeners are installed in the capturing phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerOver,
    PointerOut,
    Click,
    Resize,
    Scroll,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Over,
    Out,
    Click,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub id: EventId,
    pub kind: PointerKind,
    pub target: NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewportChange {
    Resize,
    Scroll,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    Hover,
    Highlight(ElementRole),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Mutations {
        observer: ObserverId,
        records: Vec<MutationRecord>,
    },
    Timer(TimerId),
    Pointer(PointerEvent),
    Viewport(ViewportChange),
    /// The host page is navigating away.
    Unload,
}

/// Capabilities the embedded side needs from the host page.
pub trait HostTree: Timers {
    fn is_attached(&self, node: NodeId) -> bool;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Element children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn describe(&self, node: NodeId) -> Option<NodeInfo>;

    /// Every attached element in document order.
    fn elements(&self) -> Vec<NodeId>;

    fn bounding_rect(&self, node: NodeId) -> Option<RectI>;

    fn viewport(&self) -> RectI;

    fn set_value(&mut self, node: NodeId, text: &str) -> Result<(), HostError>;

    /// Synthesizes the `input` notification page scripts listen for.
    fn dispatch_input_event(&mut self, node: NodeId) -> Result<(), HostError>;

    fn observe(&mut self, node: NodeId, options: ObserveOptions)
    -> Result<ObserverId, HostError>;

    fn disconnect(&mut self, observer: ObserverId);

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, listener: ListenerId);

    fn prevent_default(&mut self, event: EventId);

    fn create_overlay(&mut self, kind: OverlayKind) -> OverlayId;

    /// Moves an overlay to `rect`, or hides it with `None`.
    fn place_overlay(&mut self, overlay: OverlayId, rect: Option<RectI>);

    fn remove_overlay(&mut self, overlay: OverlayId);
}
