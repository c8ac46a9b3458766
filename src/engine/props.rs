//! Node Property Store - per-node engine state keyed by node identity.
//!
//! Each node gets one property record the first time the engine touches it.
//! The record lives for the node's lifetime and is released when the node is
//! discarded, so a recycled arena slot never inherits stale state.
//!
//! Records are `Rc<RefCell<..>>` so the bind engine can hold one across a
//! pass while processors look up (other) nodes freely.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::collections::{Dictionary, Subscription};
use crate::dom::NodeId;
use crate::error::Result;
use crate::template::Templator;
use crate::types::{Callback, Value};

use super::frame::BindFrame;
use super::lifecycle::{HookHandle, LifecycleEvent};
use super::ui::Ui;

/// Callback run whenever a bind pass reaches a comment node.
pub type RebindFn = Rc<dyn Fn(&mut BindFrame<'_>) -> Result<()>>;

/// Lifecycle hook callback.
pub type HookFn = Rc<dyn Fn(&Ui, NodeId)>;

/// Teardown closure, run once.
pub type Cleanup = Box<dyn FnOnce()>;

/// What keeps a `live` node re-binding.
pub enum LiveSource {
    Dictionary {
        dict: Dictionary,
        subscriptions: Vec<Subscription>,
    },
    /// Stops the signal effect's scope.
    Signal(Cleanup),
}

/// Engine state attached to one node.
#[derive(Default)]
pub struct NodeProperties {
    /// Set once the node has been through a bind pass.
    pub bound: bool,
    /// Context resolved by the last bind pass (after processors ran).
    pub ctx: Option<Value>,
    /// Templator resolved by the last bind pass.
    pub templator: Option<Templator>,
    /// Context and templator the node was last entered with.
    pub entered: Option<(Value, Templator)>,
    /// Context pinned by a repeat; wins over the parent's context.
    pub scope: Option<Value>,
    /// Text template, captured on first bind of a text node.
    pub text_template: Option<String>,
    /// Attribute templates, captured on first bind of an element.
    pub attr_templates: HashMap<String, String>,
    /// Comment hook invoked on every pass.
    pub rebind: Option<RebindFn>,
    /// Installed by the `live` attribute.
    pub live: Option<LiveSource>,
    /// Removal hook that tears `live` down; registered once per node.
    pub live_hook: Option<HookHandle>,
    /// Event listeners attached by `click`, `submit` and friends.
    pub listeners: HashMap<String, Vec<Callback>>,
    /// Lifecycle hooks: (id, event, callback).
    pub hooks: Vec<(u64, LifecycleEvent, HookFn)>,
}

impl NodeProperties {
    pub fn hooks_for(&self, event: LifecycleEvent) -> Vec<HookFn> {
        self.hooks
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, f)| f.clone())
            .collect()
    }
}

/// Shared handle to one record.
pub type Props = Rc<RefCell<NodeProperties>>;

// =============================================================================
// Store
// =============================================================================

/// Lazily populated `NodeId -> NodeProperties` map.
#[derive(Default)]
pub struct PropertyStore {
    records: HashMap<NodeId, Props>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `node`, created empty on first access.
    pub fn get(&mut self, node: NodeId) -> Props {
        self.records.entry(node).or_default().clone()
    }

    /// Record for `node` if one was ever created.
    pub fn peek(&self, node: NodeId) -> Option<Props> {
        self.records.get(&node).cloned()
    }

    /// Drop the record of a discarded node.
    pub fn release(&mut self, node: NodeId) -> Option<Props> {
        self.records.remove(&node)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
