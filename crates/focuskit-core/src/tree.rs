#![forbid(unsafe_code)]

//! Arena-backed element tree with live containment and focusability queries.
//!
//! The tree models the host surface that overlay controllers operate on:
//! elements keyed by [`NodeId`], each with a parent link and ordered
//! children. It deliberately answers every structural question from the
//! *current* tree — focusable sets and containment are recomputed per query,
//! never cached, because overlay content can change between a controller's
//! activation and a later input event.
//!
//! # Invariants
//!
//! 1. Node IDs are unique within the tree.
//! 2. `append` only attaches freshly inserted nodes, so the parent/child
//!    relation is acyclic by construction.
//! 3. Removing a node removes its entire subtree and detaches it from its
//!    parent's child list.
//! 4. `descendants` yields document order: depth-first, children in
//!    insertion order, excluding the subtree root itself.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Unique identifier for an element in the tree.
pub type NodeId = u64;

/// Externally-owned slot naming a container element.
///
/// The owning component fills the slot once its container is mounted and
/// clears it on unmount; controllers hold a clone and read it at event time.
/// An empty slot means "no container yet" and every consumer degrades to a
/// no-op.
#[derive(Debug, Clone, Default)]
pub struct NodeRef {
    slot: Rc<Cell<Option<NodeId>>>,
}

impl NodeRef {
    /// Empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot already pointing at `id`.
    #[must_use]
    pub fn to(id: NodeId) -> Self {
        let r = Self::new();
        r.set(Some(id));
        r
    }

    /// Current target, if set.
    #[must_use]
    pub fn get(&self) -> Option<NodeId> {
        self.slot.get()
    }

    /// Point the slot at `id`, or clear it with `None`.
    pub fn set(&self, id: Option<NodeId>) {
        self.slot.set(id);
    }
}

/// What an element is, for the purposes of focusability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Push button.
    Button,
    /// Single-line text input.
    TextInput,
    /// Multi-line text input.
    TextArea,
    /// Option list.
    Select,
    /// Hyperlink. Focusable only when it carries a target (see [`Element::with_href`]).
    Link,
    /// Structural grouping element.
    Container,
    /// Inert content.
    Text,
}

/// A single element in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Unique identifier.
    pub id: NodeId,
    /// Element kind.
    pub kind: ElementKind,
    /// Disabled elements never receive focus.
    pub disabled: bool,
    /// Whether a link has a navigation target.
    pub href: bool,
    /// Explicit tab index. `Some(n)` with `n < 0` removes the element from
    /// the tab order; `Some(n)` with `n >= 0` forces it in regardless of kind.
    pub tab_index: Option<i32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    /// Create a new element of the given kind.
    #[must_use]
    pub fn new(id: NodeId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            disabled: false,
            href: false,
            tab_index: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the disabled flag.
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Builder: mark a link as having a navigation target.
    #[must_use]
    pub fn with_href(mut self) -> Self {
        self.href = true;
        self
    }

    /// Builder: set an explicit tab index.
    #[must_use]
    pub fn with_tab_index(mut self, idx: i32) -> Self {
        self.tab_index = Some(idx);
        self
    }

    /// Parent element, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child IDs in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this element can receive input focus right now.
    ///
    /// An explicit tab index wins: negative opts out, non-negative opts in.
    /// Otherwise interactive kinds qualify unless disabled, and links qualify
    /// only with a target.
    #[must_use]
    pub fn is_focusable(&self) -> bool {
        if let Some(idx) = self.tab_index {
            return idx >= 0;
        }
        match self.kind {
            ElementKind::Button
            | ElementKind::TextInput
            | ElementKind::TextArea
            | ElementKind::Select => !self.disabled,
            ElementKind::Link => self.href,
            ElementKind::Container | ElementKind::Text => false,
        }
    }
}

/// Arena of elements forming a forest of trees.
#[derive(Debug, Default)]
pub struct ElementTree {
    nodes: HashMap<NodeId, Element>,
    roots: Vec<NodeId>,
}

impl ElementTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element as a root. Returns its ID.
    ///
    /// If an element with the same ID exists, it is replaced in place
    /// (keeping its position and children).
    pub fn insert(&mut self, mut element: Element) -> NodeId {
        let id = element.id;
        if let Some(existing) = self.nodes.get(&id) {
            element.parent = existing.parent;
            element.children = existing.children.clone();
            self.nodes.insert(id, element);
            return id;
        }
        element.parent = None;
        self.nodes.insert(id, element);
        self.roots.push(id);
        id
    }

    /// Insert an element as the last child of `parent`.
    ///
    /// Returns `None` (without inserting) when the parent does not exist or
    /// the ID is already taken.
    #[must_use = "a None result means the element was not inserted"]
    pub fn append(&mut self, parent: NodeId, mut element: Element) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) || self.nodes.contains_key(&element.id) {
            return None;
        }
        let id = element.id;
        element.parent = Some(parent);
        self.nodes.insert(id, element);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Remove an element and its entire subtree.
    ///
    /// Returns the removed element, or `None` if not present.
    #[must_use = "use the removed element (if any)"]
    pub fn remove(&mut self, id: NodeId) -> Option<Element> {
        let mut doomed = self.descendants(id);
        for child in doomed.drain(..) {
            self.nodes.remove(&child);
        }
        let element = self.nodes.remove(&id)?;
        match element.parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        Some(element)
    }

    /// Look up an element by ID.
    #[must_use = "use the returned element (if any)"]
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(&id)
    }

    /// Mutably look up an element by ID.
    ///
    /// Structural fields (parent, children) are not exposed mutably; use
    /// [`ElementTree::append`] / [`ElementTree::remove`] to restructure.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(&id)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is a descendant of (or equal to) `ancestor`.
    ///
    /// Walks the live parent chain at call time. Unknown IDs are contained
    /// by nothing.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        if !self.nodes.contains_key(&ancestor) {
            return false;
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    /// Descendants of `root` in document order (depth-first, children in
    /// insertion order). Excludes `root` itself.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&root) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        // Reverse so the stack pops children in insertion order.
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.nodes.get(&id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Focusable descendants of `container` in document order.
    ///
    /// Recomputed from the live tree on every call.
    #[must_use]
    pub fn focusable_descendants(&self, container: NodeId) -> Vec<NodeId> {
        self.descendants(container)
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(Element::is_focusable))
            .collect()
    }

    /// All focusable elements in the tree in document order, roots first.
    ///
    /// This is the surface-wide tab order that native navigation follows.
    #[must_use]
    pub fn focusables(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for root in &self.roots {
            if self.nodes.get(root).is_some_and(Element::is_focusable) {
                out.push(*root);
            }
            out.extend(self.focusable_descendants(*root));
        }
        out
    }
}

// =========================================================================
// Tests
// =========================================================================
