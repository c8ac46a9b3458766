//! Lifecycle hooks - added / removed / moved signals per node.
//!
//! Tree mutations made through the engine compare each moved node's
//! connectivity before and after the change:
//! - disconnected -> connected fires `Added`
//! - connected -> disconnected fires `Removed`
//! - connected -> connected (re-inserted) fires `Moved`
//!
//! Each signal is delivered depth-first over the node's subtree. Hooks are
//! stored in the node's property record, so discarding a node drops them.

use tracing::debug;

use crate::dom::{NodeId, NodeType};
use crate::error::{Result, UiError};

use super::props::{HookFn, LiveSource, Props};
use super::ui::Ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Added,
    Removed,
    Moved,
}

/// Deregistration capability returned by hook registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookHandle {
    node: NodeId,
    event: LifecycleEvent,
    id: u64,
}

impl HookHandle {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn event(&self) -> LifecycleEvent {
        self.event
    }
}

// =============================================================================
// Registration
// =============================================================================

impl Ui {
    pub fn on_added(&self, node: NodeId, f: impl Fn(&Ui, NodeId) + 'static) -> HookHandle {
        self.hook(node, LifecycleEvent::Added, std::rc::Rc::new(f))
    }

    pub fn on_removed(&self, node: NodeId, f: impl Fn(&Ui, NodeId) + 'static) -> HookHandle {
        self.hook(node, LifecycleEvent::Removed, std::rc::Rc::new(f))
    }

    pub fn on_moved(&self, node: NodeId, f: impl Fn(&Ui, NodeId) + 'static) -> HookHandle {
        self.hook(node, LifecycleEvent::Moved, std::rc::Rc::new(f))
    }

    fn hook(&self, node: NodeId, event: LifecycleEvent, f: HookFn) -> HookHandle {
        let id = self.inner.next_hook.get();
        self.inner.next_hook.set(id + 1);
        self.props(node).borrow_mut().hooks.push((id, event, f));
        HookHandle { node, event, id }
    }

    /// Deregister a hook. Returns false when it was already gone.
    pub fn off(&self, handle: HookHandle) -> bool {
        let Some(props) = self.peek_props(handle.node) else {
            return false;
        };
        let mut props = props.borrow_mut();
        let before = props.hooks.len();
        props.hooks.retain(|(id, _, _)| *id != handle.id);
        props.hooks.len() != before
    }

    fn emit(&self, node: NodeId, event: LifecycleEvent) {
        let subtree = self.doc().subtree(node);
        for n in subtree {
            let hooks = self
                .peek_props(n)
                .map(|p| p.borrow().hooks_for(event))
                .unwrap_or_default();
            for hook in hooks {
                hook(self, n);
            }
        }
    }
}

// =============================================================================
// Mutations
// =============================================================================

impl Ui {
    /// Nodes that actually move when `child` is inserted.
    fn moving(&self, child: NodeId) -> Vec<(NodeId, bool)> {
        let doc = self.doc();
        let nodes = if doc.node_type(child) == Some(NodeType::Fragment) {
            doc.children(child).to_vec()
        } else {
            vec![child]
        };
        nodes
            .into_iter()
            .map(|n| (n, doc.is_connected(n)))
            .collect()
    }

    fn settle(&self, moved: Vec<(NodeId, bool)>) {
        for (node, was_connected) in moved {
            let now = self.doc().is_connected(node);
            match (was_connected, now) {
                (false, true) => self.emit(node, LifecycleEvent::Added),
                (true, false) => self.emit(node, LifecycleEvent::Removed),
                (true, true) => self.emit(node, LifecycleEvent::Moved),
                (false, false) => {}
            }
        }
    }

    /// Insert `child` under `parent` before `reference` (append when `None`).
    pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        let moved = self.moving(child);
        self.inner.doc.borrow_mut().insert_before(parent, child, reference)?;
        self.settle(moved);
        Ok(())
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `node` right after `after`.
    pub fn insert_after(&self, node: NodeId, after: NodeId) -> Result<()> {
        let moved = self.moving(node);
        self.inner.doc.borrow_mut().insert_after(node, after)?;
        self.settle(moved);
        Ok(())
    }

    /// Detach `node` from its parent, keeping it alive.
    pub fn remove(&self, node: NodeId) {
        let was_connected = self.doc().is_connected(node);
        self.inner.doc.borrow_mut().detach(node);
        self.settle(vec![(node, was_connected)]);
    }

    /// Remove `node` and free its subtree, releasing every property record.
    pub fn discard(&self, node: NodeId) {
        if !self.doc().contains(node) || node == self.root() {
            return;
        }
        if self.doc().is_connected(node) {
            self.emit(node, LifecycleEvent::Removed);
        }
        // A removed hook may already have discarded it
        if !self.doc().contains(node) {
            return;
        }
        let freed = self.inner.doc.borrow_mut().discard(node);
        let released: Vec<Props> = {
            let mut store = self.inner.props.borrow_mut();
            freed.iter().filter_map(|&n| store.release(n)).collect()
        };
        for props in released {
            teardown_live(&props);
        }
    }

    /// Discard every child of `node`.
    pub fn empty(&self, node: NodeId) {
        let children = self.doc().children(node).to_vec();
        for child in children {
            self.discard(child);
        }
    }

    /// Fail with `StaleNode` unless `node` is alive.
    pub fn check_node(&self, node: NodeId) -> Result<()> {
        if self.doc().contains(node) {
            Ok(())
        } else {
            Err(UiError::StaleNode(node))
        }
    }
}

/// Stop whatever keeps a `live` node re-binding.
pub(crate) fn teardown_live(props: &Props) {
    let live = props.borrow_mut().live.take();
    match live {
        Some(LiveSource::Dictionary { dict, subscriptions }) => {
            for sub in subscriptions {
                dict.off(sub);
            }
            debug!("live dictionary subscriptions released");
        }
        Some(LiveSource::Signal(stop)) => stop(),
        None => {}
    }
}
