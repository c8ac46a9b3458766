//! Bind Engine - resolve a node and its subtree against a context.
//!
//! A bind pass is a pre-order walk. Each node gets a [`BindFrame`]:
//!
//! ```text
//! enter   -> first_pass from the property store, ctx/templator inherited
//! text    -> re-evaluate the cached text template
//! element -> run attribute processors in pipeline order
//! comment -> call the attached rebind callback
//! render  -> replace the tag with a clone of the named view
//! recurse -> children, with the next sibling captured before each visit
//! exit    -> run `after` callbacks, persist ctx/templator
//! ```

use tracing::{trace, warn};

use crate::dom::{NodeId, NodeType};
use crate::error::{Result, UiError};
use crate::template::Templator;
use crate::types::Value;

use super::frame::BindFrame;
use super::mediators::AttrValue;
use super::props::Props;
use super::ui::Ui;

impl Ui {
    /// Bind `node` against `ctx` with `templator`.
    ///
    /// Either may be `None`; it is then inherited from the nearest node on the
    /// ancestor chain that has been bound, and the templator falls back to the
    /// configured default.
    pub fn bind(&self, node: NodeId, ctx: Option<Value>, templator: Option<Templator>) -> Result<()> {
        self.bind_frame(node, ctx, templator, None)
    }

    /// Bind `node` again with whatever it inherits.
    pub fn rebind(&self, node: NodeId) -> Result<()> {
        self.bind_frame(node, None, None, None)
    }

    pub(crate) fn bind_frame<'a>(
        &'a self,
        node: NodeId,
        ctx: Option<Value>,
        templator: Option<Templator>,
        parent: Option<&'a BindFrame<'a>>,
    ) -> Result<()> {
        let (node_type, tag) = {
            let doc = self.doc();
            let kind = doc.kind(node).ok_or(UiError::StaleNode(node))?;
            (kind.node_type(), doc.tag_name(node).map(str::to_string))
        };
        if tag.as_deref().is_some_and(|t| self.config().is_skipped(t)) {
            return Ok(());
        }

        let props = self.props(node);
        let first_pass = {
            let mut p = props.borrow_mut();
            !std::mem::replace(&mut p.bound, true)
        };
        let ctx = match ctx {
            Some(ctx) => ctx,
            None => self.inherited_ctx(node).unwrap_or_default(),
        };
        let templator = templator
            .or_else(|| self.inherited_templator(node))
            .unwrap_or_else(|| self.config().default_templator.clone());
        props.borrow_mut().entered = Some((ctx.clone(), templator.clone()));

        trace!(node = ?node, first_pass, depth = parent.map_or(0, |p| p.depth() + 1), "bind");

        let mut frame = BindFrame::new(self, node, ctx, templator, first_pass, parent);
        match node_type {
            NodeType::Text => self.bind_text(&frame, &props)?,
            NodeType::Element => self.bind_attributes(&mut frame, &props)?,
            NodeType::Comment => {
                let rebind = props.borrow().rebind.clone();
                if let Some(rebind) = rebind {
                    rebind(&mut frame)?;
                }
            }
            NodeType::Document | NodeType::Fragment => {}
        }

        if frame.proceed && self.doc().contains(node) {
            if tag.as_deref() == Some(self.config().render_tag.as_str()) {
                self.substitute_render_tag(&frame)?;
            } else if matches!(
                node_type,
                NodeType::Element | NodeType::Fragment | NodeType::Document
            ) {
                self.bind_children(&frame)?;
            }
        }

        for after in std::mem::take(&mut frame.after) {
            after(self)?;
        }

        let mut p = props.borrow_mut();
        p.ctx = Some(frame.ctx);
        p.templator = Some(frame.templator);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inheritance
    // -------------------------------------------------------------------------

    /// The node's own pinned or entry context, else the nearest bound ancestor's.
    fn inherited_ctx(&self, node: NodeId) -> Option<Value> {
        let own = self.peek_props(node).and_then(|p| {
            let p = p.borrow();
            p.scope
                .clone()
                .or_else(|| p.entered.as_ref().map(|(ctx, _)| ctx.clone()))
        });
        own.or_else(|| {
            let ancestors: Vec<NodeId> = self.doc().ancestors(node).collect();
            ancestors
                .into_iter()
                .find_map(|a| self.peek_props(a).and_then(|p| p.borrow().ctx.clone()))
        })
    }

    fn inherited_templator(&self, node: NodeId) -> Option<Templator> {
        let own = self
            .peek_props(node)
            .and_then(|p| p.borrow().entered.as_ref().map(|(_, t)| t.clone()));
        own.or_else(|| {
            let ancestors: Vec<NodeId> = self.doc().ancestors(node).collect();
            ancestors
                .into_iter()
                .find_map(|a| self.peek_props(a).and_then(|p| p.borrow().templator.clone()))
        })
    }

    // -------------------------------------------------------------------------
    // Node kinds
    // -------------------------------------------------------------------------

    fn bind_text(&self, frame: &BindFrame<'_>, props: &Props) -> Result<()> {
        let node = frame.node;
        let template = {
            let current = self.doc().text(node).unwrap_or_default().to_string();
            props
                .borrow_mut()
                .text_template
                .get_or_insert(current)
                .clone()
        };
        match frame.templator.apply(&template, &frame.ctx) {
            Value::Node(replacement) => {
                if self.doc().parent(node).is_some() {
                    self.insert_after(replacement, node)?;
                }
                self.discard(node);
            }
            value => self.doc_mut().set_text(node, &value.to_display()),
        }
        Ok(())
    }

    fn bind_attributes(&self, frame: &mut BindFrame<'_>, props: &Props) -> Result<()> {
        let node = frame.node;
        let had_parent = self.doc().parent(node).is_some();

        let mut names = self.doc().attribute_names(node);
        self.inner.attributes.borrow().sort(&mut names);
        {
            let doc = self.doc();
            let mut p = props.borrow_mut();
            for name in &names {
                if !p.attr_templates.contains_key(name) {
                    if let Some(value) = doc.get_attribute(node, name) {
                        p.attr_templates.insert(name.clone(), value.to_string());
                    }
                }
            }
        }

        for name in names {
            if !frame.proceed {
                break;
            }
            let Some(template) = props.borrow().attr_templates.get(&name).cloned() else {
                continue;
            };
            let value = self.resolve_attribute(node, &template, &frame.ctx, &frame.templator)?;

            let handler = self.inner.attributes.borrow().get(&name);
            match handler {
                Some(handler) => handler(frame, node, value)?,
                None => {
                    let mut doc = self.doc_mut();
                    if doc.has_attribute(node, &name) {
                        doc.set_attribute(node, &name, &value.to_display());
                    }
                }
            }

            let doc = self.doc();
            if !doc.contains(node) || (had_parent && doc.parent(node).is_none()) {
                frame.proceed = false;
            }
        }
        Ok(())
    }

    /// Resolve an attribute template: mediator reference first, templator otherwise.
    pub(crate) fn resolve_attribute(
        &self,
        node: NodeId,
        template: &str,
        ctx: &Value,
        templator: &Templator,
    ) -> Result<Value> {
        if let AttrValue::MediatorRef { mediator, property } = AttrValue::parse(template) {
            let resolved = self.inner.mediators.borrow().resolve(mediator, property);
            if let Some((handler, raw)) = resolved {
                return handler(self, node, ctx, &raw);
            }
        }
        Ok(templator.apply(template, ctx))
    }

    fn substitute_render_tag(&self, frame: &BindFrame<'_>) -> Result<()> {
        let node = frame.node;
        let name_attr = &self.config().name_attribute;
        let name = self
            .doc()
            .get_attribute(node, name_attr)
            .map(str::to_string)
            .ok_or_else(|| UiError::MissingAttribute {
                tag: self.config().render_tag.clone(),
                attribute: name_attr.clone(),
            })?;

        let view = self.clone_view(&name)?;
        let (is_fragment, first) = {
            let doc = self.doc();
            let is_fragment = doc.node_type(view) == Some(NodeType::Fragment);
            let first = if is_fragment { doc.first_child(view) } else { Some(view) };
            (is_fragment, first)
        };

        if self.doc().parent(node).is_some() {
            self.insert_after(view, node)?;
            if first.is_some() {
                frame.skip_to(first);
            }
        }
        self.discard(node);
        if is_fragment {
            self.discard(view);
        }
        trace!(node = ?node, view = %name, "render tag substituted");
        Ok(())
    }

    fn bind_children(&self, frame: &BindFrame<'_>) -> Result<()> {
        let node = frame.node;
        let mut cursor = self.doc().first_child(node);

        while let Some(child) = cursor {
            frame.set_next(self.doc().next_sibling(child));

            let pinned = self.peek_props(child).and_then(|p| p.borrow().scope.clone());
            let ctx = pinned.unwrap_or_else(|| frame.ctx.clone());
            self.bind_frame(child, Some(ctx), Some(frame.templator.clone()), Some(frame))?;

            cursor = frame.next();
            if let Some(next) = cursor {
                if self.doc().parent(next) != Some(node) {
                    warn!(parent = ?node, next = ?next, "iteration cursor left its parent, stopping");
                    break;
                }
            }
        }
        Ok(())
    }
}
