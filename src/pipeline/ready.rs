//! Readiness - view loading and the pending-work queue.
//!
//! Until [`Ui::ready`] fires, renders and `on_loaded` callbacks are queued.
//! Firing loads every view declared in the document, marks the engine ready
//! and runs the queue once, in arrival order.

use std::mem;

use tracing::{debug, warn};

use crate::dom::{NodeId, NodeType};
use crate::engine::Ui;
use crate::error::{Result, UiError};
use crate::types::Value;

use super::render::RenderString;

/// Work deferred until readiness.
pub(crate) enum Pending {
    Render(Vec<RenderString>, Value),
    Loaded(Box<dyn FnOnce(&Ui) -> Result<()>>),
}

#[derive(Default)]
pub struct Readiness {
    ready: bool,
    pending: Vec<Pending>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn push(&mut self, item: Pending) {
        self.pending.push(item);
    }
}

impl Ui {
    pub fn is_ready(&self) -> bool {
        self.inner.readiness.borrow().is_ready()
    }

    /// Number of queued renders and callbacks.
    pub fn pending(&self) -> usize {
        self.inner.readiness.borrow().pending()
    }

    /// Run `f` once the engine is ready (immediately if it already is).
    pub fn on_loaded(&self, f: impl FnOnce(&Ui) -> Result<()> + 'static) -> Result<()> {
        if self.is_ready() {
            return f(self);
        }
        self.inner
            .readiness
            .borrow_mut()
            .push(Pending::Loaded(Box::new(f)));
        Ok(())
    }

    /// Fire the readiness signal.
    ///
    /// Loads views from the document, then flushes the queue. Every queued
    /// item runs even if an earlier one fails; the first failure is returned.
    /// Calling it again is a no-op.
    pub fn ready(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        let loaded = self.load_views()?;
        let pending = {
            let mut readiness = self.inner.readiness.borrow_mut();
            readiness.ready = true;
            mem::take(&mut readiness.pending)
        };
        debug!(views = loaded, pending = pending.len(), "ready");

        let mut first_err = None;
        for item in pending {
            let result = match item {
                Pending::Render(strings, ctx) => self.render_now(&strings, ctx),
                Pending::Loaded(f) => f(self),
            };
            if let Err(err) = result {
                warn!(error = %err, "queued work failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Move view declarations out of the document into the view registry.
    ///
    /// - `<tr l-view="row">`: the element becomes view `row`, attribute stripped
    /// - `<l-view name="row">`: its children become view `row`, wrapper discarded
    ///
    /// Returns the number of views loaded.
    pub fn load_views(&self) -> Result<usize> {
        let cfg = self.config();
        let (marked, wrappers) = {
            let doc = self.doc();
            let descendants = doc.descendants(doc.root());
            let marked: Vec<NodeId> = descendants
                .iter()
                .copied()
                .filter(|&n| doc.has_attribute(n, &cfg.view_attribute))
                .collect();
            let wrappers: Vec<NodeId> = descendants
                .into_iter()
                .filter(|&n| doc.tag_name(n) == Some(cfg.view_tag.as_str()))
                .collect();
            (marked, wrappers)
        };

        let mut count = 0;
        for node in marked {
            // Nested inside a view loaded earlier in this pass
            if !self.doc().is_connected(node) {
                continue;
            }
            let name = self
                .doc_mut()
                .remove_attribute(node, &cfg.view_attribute)
                .unwrap_or_default();
            self.remove(node);
            self.define_view_node(&name, node)?;
            count += 1;
        }

        for wrapper in wrappers {
            if !self.doc().contains(wrapper) || !self.doc().is_connected(wrapper) {
                continue;
            }
            let name = self
                .doc()
                .get_attribute(wrapper, &cfg.name_attribute)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .ok_or_else(|| UiError::MissingAttribute {
                    tag: cfg.view_tag.clone(),
                    attribute: cfg.name_attribute.clone(),
                })?;
            let fragment = {
                let mut doc = self.doc_mut();
                let fragment = doc.create_fragment();
                let children = doc.children(wrapper).to_vec();
                let blank = |n: NodeId| {
                    doc.node_type(n) == Some(NodeType::Text)
                        && doc.text(n).is_some_and(|t| t.trim().is_empty())
                };
                // Whitespace around the content is layout, not part of the view
                let start = children.iter().position(|&c| !blank(c));
                let end = children.iter().rposition(|&c| !blank(c));
                let content = match (start, end) {
                    (Some(s), Some(e)) => children[s..=e].to_vec(),
                    _ => Vec::new(),
                };
                for child in content {
                    doc.append_child(fragment, child)?;
                }
                fragment
            };
            self.discard(wrapper);
            self.define_view_node(&name, fragment)?;
            count += 1;
        }
        Ok(count)
    }
}
