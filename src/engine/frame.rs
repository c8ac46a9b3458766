//! Bind frames - the state threaded through one bind pass.
//!
//! Every node entered by the bind engine gets a frame linked to its parent's
//! frame. Attribute processors receive the frame mutably and steer the pass
//! through it:
//! - swap the context or templator seen by the rest of the node
//! - clear `proceed` to stop attribute processing and child traversal
//! - defer work with [`BindFrame::after`] until the node's subtree is done
//! - move the parent's child cursor with [`BindFrame::skip_to`]

use std::cell::Cell;

use crate::dom::NodeId;
use crate::error::Result;
use crate::template::Templator;
use crate::types::Value;

use super::ui::Ui;

/// Deferred callback run when the frame's node finishes binding.
pub type AfterFn = Box<dyn FnOnce(&Ui) -> Result<()>>;

pub struct BindFrame<'a> {
    pub(crate) ui: &'a Ui,
    pub(crate) node: NodeId,
    pub(crate) ctx: Value,
    pub(crate) templator: Templator,
    pub(crate) proceed: bool,
    pub(crate) first_pass: bool,
    pub(crate) after: Vec<AfterFn>,
    /// Next child to visit while this frame iterates its children.
    pub(crate) next: Cell<Option<NodeId>>,
    pub(crate) parent: Option<&'a BindFrame<'a>>,
}

impl<'a> BindFrame<'a> {
    pub(crate) fn new(
        ui: &'a Ui,
        node: NodeId,
        ctx: Value,
        templator: Templator,
        first_pass: bool,
        parent: Option<&'a BindFrame<'a>>,
    ) -> Self {
        Self {
            ui,
            node,
            ctx,
            templator,
            proceed: true,
            first_pass,
            after: Vec::new(),
            next: Cell::new(None),
            parent,
        }
    }

    pub fn ui(&self) -> &'a Ui {
        self.ui
    }

    /// Node this frame is binding.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn ctx(&self) -> &Value {
        &self.ctx
    }

    pub fn set_ctx(&mut self, ctx: Value) {
        self.ctx = ctx;
    }

    pub fn templator(&self) -> &Templator {
        &self.templator
    }

    pub fn set_templator(&mut self, templator: Templator) {
        self.templator = templator;
    }

    pub fn proceed(&self) -> bool {
        self.proceed
    }

    /// Stop processing this node's remaining attributes and children.
    pub fn stop(&mut self) {
        self.proceed = false;
    }

    /// True on the node's first bind pass only.
    pub fn first_pass(&self) -> bool {
        self.first_pass
    }

    /// Run `f` after this node and its subtree are bound.
    pub fn after(&mut self, f: impl FnOnce(&Ui) -> Result<()> + 'static) {
        self.after.push(Box::new(f));
    }

    pub fn parent(&self) -> Option<&'a BindFrame<'a>> {
        self.parent
    }

    /// Number of frames above this one.
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent, |f| f.parent).count()
    }

    pub(crate) fn set_next(&self, next: Option<NodeId>) {
        self.next.set(next);
    }

    pub(crate) fn next(&self) -> Option<NodeId> {
        self.next.get()
    }

    /// Point the parent's child iteration at `node` (or end it with `None`).
    ///
    /// Used by processors that replace or add siblings of the node being
    /// bound, so the parent neither misses new nodes nor visits freed ones.
    pub fn skip_to(&self, node: Option<NodeId>) {
        if let Some(parent) = self.parent {
            parent.set_next(node);
        }
    }

    /// Bind `node` inside this pass, as a child of this frame.
    pub fn bind_nested(&self, node: NodeId, ctx: Value) -> Result<()> {
        let templator = self.templator.clone();
        self.ui.bind_frame(node, Some(ctx), Some(templator), Some(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_chain_and_cursor() {
        let ui = Ui::new();
        let (a, b, c) = {
            let mut doc = ui.doc_mut();
            (
                doc.create_element("div"),
                doc.create_element("p"),
                doc.create_element("span"),
            )
        };

        let root = BindFrame::new(&ui, a, Value::Null, Templator::standard(), true, None);
        let mut child = BindFrame::new(&ui, b, Value::from(1), Templator::standard(), false, Some(&root));

        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent().map(|p| p.node()), Some(a));
        assert!(!child.first_pass());

        child.skip_to(Some(c));
        assert_eq!(root.next(), Some(c));

        child.stop();
        assert!(!child.proceed());
        child.set_ctx(Value::from(2));
        assert_eq!(child.ctx(), &Value::from(2));
    }
}
