//! Document arena - Node allocation and tree structure.
//!
//! Nodes are NOT objects. They are slots in an arena addressed by [`NodeId`]:
//! - Slot index + generation (a discarded id never aliases a new node)
//! - Free slot pool for O(1) reuse
//! - Parent link + ordered child list per node
//!
//! The arena owns every node, attached or not. Detached nodes (views,
//! repeat templates) stay alive until [`Document::discard`] frees them.

use std::fmt;

use crate::error::{Result, UiError};

use super::selector::Selector;

// =============================================================================
// Node Identity
// =============================================================================

/// Stable identity of a node in a [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index (reused after discard, unlike the full id).
    pub fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

/// Node discriminant, numbered like the DOM's `nodeType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
    Fragment = 11,
}

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Fragment,
    Element { tag: String, attrs: Vec<Attribute> },
    Text(String),
    Comment(String),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::Fragment => NodeType::Fragment,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
        }
    }
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

// =============================================================================
// Document
// =============================================================================

/// Arena-backed node tree with a single root.
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document whose root is a `Document` node.
    pub fn new() -> Self {
        Self::with_root(NodeKind::Document)
    }

    /// Create a document whose root is a fragment.
    pub fn fragment() -> Self {
        Self::with_root(NodeKind::Fragment)
    }

    fn with_root(kind: NodeKind) -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
        };
        doc.root = doc.allocate(kind);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes (attached or not).
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            NodeId { index, generation: 0 }
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.allocate(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.allocate(NodeKind::Comment(text.to_string()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.allocate(NodeKind::Fragment)
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    fn live(&self, id: NodeId) -> Result<&NodeData> {
        self.data(id).ok_or(UiError::StaleNode(id))
    }

    /// True while `id` has not been discarded.
    pub fn contains(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|d| &d.kind)
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.kind(id).map(NodeKind::node_type)
    }

    /// Lowercase tag name for elements.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map(|d| d.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// True when `id` is the root or hangs under it.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.root, id)
    }

    /// Pre-order list of `id` and everything under it.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Pre-order descendants of `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut all = self.subtree(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    fn attrs(&self, id: NodeId) -> Option<&Vec<Attribute>> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.attrs(id)?
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Attribute names in document order.
    pub fn attribute_names(&self, id: NodeId) -> Vec<String> {
        self.attrs(id)
            .map(|attrs| attrs.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Set (or add) an attribute. Ignored for non-elements.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let Some(attrs) = self.attrs_mut(id) else { return };
        match attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => attrs.push(Attribute {
                name,
                value: value.to_string(),
            }),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let attrs = self.attrs_mut(id)?;
        let pos = attrs.iter().position(|a| a.name == name)?;
        Some(attrs.remove(pos).value)
    }

    // -------------------------------------------------------------------------
    // Character data
    // -------------------------------------------------------------------------

    /// Data of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(s) | NodeKind::Comment(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(data) = self.data_mut(id) {
            if let NodeKind::Text(s) | NodeKind::Comment(s) = &mut data.kind {
                *s = text.to_string();
            }
        }
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.subtree(id)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                Some(NodeKind::Text(s)) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Detach `id` from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else { return };
        if let Some(data) = self.data_mut(parent) {
            data.children.retain(|&c| c != id);
        }
        if let Some(data) = self.data_mut(id) {
            data.parent = None;
        }
    }

    /// Insert `child` under `parent` before `reference` (append when `None`).
    ///
    /// A fragment child is emptied: its children move, in order, and the
    /// fragment itself stays detached.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.live(parent)?;
        let child_type = self.live(child)?.kind.node_type();

        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(UiError::Hierarchy(format!(
                    "{reference:?} is not a child of {parent:?}"
                )));
            }
        }
        if matches!(child_type, NodeType::Document) {
            return Err(UiError::Hierarchy("cannot insert a document node".into()));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(UiError::Hierarchy(format!(
                "cannot insert {child:?} into its own subtree"
            )));
        }

        let moving: Vec<NodeId> = if child_type == NodeType::Fragment {
            self.children(child).to_vec()
        } else {
            vec![child]
        };
        if reference == Some(child) {
            return Ok(());
        }

        for &node in &moving {
            self.detach(node);
        }
        let mut at = match reference {
            Some(r) => self.children(parent).iter().position(|&c| c == r).unwrap_or(0),
            None => self.children(parent).len(),
        };
        for node in moving {
            if let Some(data) = self.data_mut(parent) {
                data.children.insert(at, node);
            }
            if let Some(data) = self.data_mut(node) {
                data.parent = Some(parent);
            }
            at += 1;
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `node` right after `after`, which must have a parent.
    pub fn insert_after(&mut self, node: NodeId, after: NodeId) -> Result<()> {
        let parent = self.parent(after).ok_or_else(|| {
            UiError::Hierarchy("insert_after: reference node has no parent".into())
        })?;
        let next = self.next_sibling(after);
        self.insert_before(parent, node, next)
    }

    /// Deep, detached copy of `id`.
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let kind = self.live(id)?.kind.clone();
        let copy = self.allocate(kind);
        for child in self.children(id).to_vec() {
            let child_copy = self.deep_clone(child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// Detach `id` and free its whole subtree. Returns the freed ids.
    pub fn discard(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == self.root {
            return Vec::new();
        }
        self.detach(id);
        let freed = self.subtree(id);
        for &node in &freed {
            let slot = &mut self.slots[node.index as usize];
            slot.data = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        freed
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// First descendant of `scope` matching `selector`, in document order.
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| selector.matches(self, n))
    }

    /// Every descendant of `scope` matching `selector`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    pub fn element_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.get_attribute(n, "id") == Some(id))
    }
}

/// Iterator over a node's ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(doc: &mut Document) -> (NodeId, NodeId, NodeId, NodeId) {
        let ul = doc.create_element("UL");
        let a = doc.create_element("li");
        let b = doc.create_element("li");
        let c = doc.create_element("li");
        for li in [a, b, c] {
            doc.append_child(ul, li).unwrap();
        }
        (ul, a, b, c)
    }

    #[test]
    fn test_append_and_siblings() {
        let mut doc = Document::new();
        let (ul, a, b, c) = list(&mut doc);

        assert_eq!(doc.tag_name(ul), Some("ul"));
        assert_eq!(doc.children(ul), &[a, b, c]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.previous_sibling(c), Some(b));
        assert_eq!(doc.next_sibling(c), None);
        assert_eq!(doc.parent(b), Some(ul));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let mut doc = Document::new();
        let (ul, a, b, c) = list(&mut doc);

        doc.insert_before(ul, c, Some(a)).unwrap();
        assert_eq!(doc.children(ul), &[c, a, b]);
    }

    #[test]
    fn test_fragment_insert_moves_children() {
        let mut doc = Document::new();
        let (ul, a, _, _) = list(&mut doc);
        let frag = doc.create_fragment();
        let x = doc.create_text("x");
        let y = doc.create_text("y");
        doc.append_child(frag, x).unwrap();
        doc.append_child(frag, y).unwrap();

        doc.insert_before(ul, frag, Some(a)).unwrap();
        assert_eq!(&doc.children(ul)[..2], &[x, y]);
        assert!(doc.children(frag).is_empty());
        assert_eq!(doc.parent(frag), None);
    }

    #[test]
    fn test_insert_into_own_subtree_fails() {
        let mut doc = Document::new();
        let (ul, a, _, _) = list(&mut doc);
        let err = doc.append_child(a, ul).unwrap_err();
        assert!(matches!(err, UiError::Hierarchy(_)));
    }

    #[test]
    fn test_reference_must_be_child() {
        let mut doc = Document::new();
        let (ul, _, _, _) = list(&mut doc);
        let stray = doc.create_element("p");
        let other = doc.create_element("p");
        let err = doc.insert_before(ul, other, Some(stray)).unwrap_err();
        assert!(matches!(err, UiError::Hierarchy(_)));
    }

    #[test]
    fn test_deep_clone_is_detached_copy() {
        let mut doc = Document::new();
        let (ul, a, _, _) = list(&mut doc);
        doc.set_attribute(a, "class", "first");
        let root = doc.root();
        doc.append_child(root, ul).unwrap();

        let copy = doc.deep_clone(ul).unwrap();
        assert_ne!(copy, ul);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.children(copy).len(), 3);
        let first = doc.children(copy)[0];
        assert_eq!(doc.get_attribute(first, "class"), Some("first"));

        doc.set_attribute(first, "class", "changed");
        assert_eq!(doc.get_attribute(a, "class"), Some("first"));
    }

    #[test]
    fn test_discard_frees_subtree_and_bumps_generation() {
        let mut doc = Document::new();
        let (ul, a, b, c) = list(&mut doc);
        let before = doc.len();

        let freed = doc.discard(ul);
        assert_eq!(freed.len(), 4);
        assert_eq!(doc.len(), before - 4);
        for id in [ul, a, b, c] {
            assert!(!doc.contains(id));
        }

        // Reused slot gets a new identity
        let fresh = doc.create_element("div");
        assert!(freed.iter().any(|f| f.index() == fresh.index()));
        assert!(!freed.contains(&fresh));
    }

    #[test]
    fn test_attributes_are_case_insensitive_and_ordered() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "Repeat", "$items");
        doc.set_attribute(div, "class", "x");

        assert_eq!(doc.get_attribute(div, "REPEAT"), Some("$items"));
        assert_eq!(doc.attribute_names(div), vec!["repeat", "class"]);
        assert_eq!(doc.remove_attribute(div, "repeat"), Some("$items".into()));
        assert_eq!(doc.attribute_names(div), vec!["class"]);
    }

    #[test]
    fn test_connectivity() {
        let mut doc = Document::new();
        let (ul, a, _, _) = list(&mut doc);
        assert!(!doc.is_connected(a));
        let root = doc.root();
        doc.append_child(root, ul).unwrap();
        assert!(doc.is_connected(a));
        doc.detach(ul);
        assert!(!doc.is_connected(a));
    }
}
