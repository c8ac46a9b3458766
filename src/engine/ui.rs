//! The engine object.
//!
//! [`Ui`] owns everything a bind needs: the document, the Node Property
//! Store, the View/Attribute/Mediator registries, readiness state and the
//! configuration. Several engines can live side by side; nothing is global.
//!
//! `Ui` is a cheap `Rc` handle. Long-lived closures (collection listeners,
//! rebind callbacks, signal effects) hold a [`WeakUi`] instead, so they never
//! keep the engine alive on their own.
//!
//! Registries sit behind `RefCell`s and are never borrowed across a call into
//! user code, so processors, mediators and hooks may call back into the
//! engine freely.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::config::UiConfig;
use crate::dom::{markup, Document, NodeId, Selector};
use crate::error::{Result, UiError};
use crate::pipeline::Readiness;
use crate::primitives;
use crate::types::{Callback, Value};

use super::attributes::{AttributeFn, AttributePipeline, NamedAttribute};
use super::frame::BindFrame;
use super::mediators::{Mediator, MediatorFn, MediatorRegistry};
use super::props::{Props, PropertyStore};
use super::views::ViewRegistry;

pub(crate) struct UiInner {
    pub(crate) config: UiConfig,
    pub(crate) doc: RefCell<Document>,
    pub(crate) props: RefCell<PropertyStore>,
    pub(crate) views: RefCell<ViewRegistry>,
    pub(crate) attributes: RefCell<AttributePipeline>,
    pub(crate) mediators: RefCell<MediatorRegistry>,
    pub(crate) readiness: RefCell<Readiness>,
    pub(crate) next_hook: Cell<u64>,
}

/// Handle to a view-binding engine.
#[derive(Clone)]
pub struct Ui {
    pub(crate) inner: Rc<UiInner>,
}

/// Non-owning handle; see [`Ui::downgrade`].
#[derive(Clone)]
pub struct WeakUi(Weak<UiInner>);

impl WeakUi {
    pub fn upgrade(&self) -> Option<Ui> {
        self.0.upgrade().map(|inner| Ui { inner })
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ui")
            .field("nodes", &self.inner.doc.borrow().len())
            .field("ready", &self.is_ready())
            .finish()
    }
}

// =============================================================================
// Construction
// =============================================================================

impl Ui {
    /// Engine over an empty document, default configuration.
    pub fn new() -> Self {
        Self::build(UiConfig::default(), Document::new())
    }

    pub fn with_config(config: UiConfig) -> Self {
        Self::build(config, Document::new())
    }

    /// Engine whose root is a fragment parsed from `source`.
    pub fn from_markup(source: &str) -> Result<Self> {
        Self::from_markup_with_config(source, UiConfig::default())
    }

    pub fn from_markup_with_config(source: &str, config: UiConfig) -> Result<Self> {
        let mut doc = Document::fragment();
        let parsed = markup::parse_fragment(&mut doc, source)?;
        let root = doc.root();
        doc.append_child(root, parsed)?;
        doc.discard(parsed);
        Ok(Self::build(config, doc))
    }

    fn build(config: UiConfig, doc: Document) -> Self {
        let install = config.install_defaults;
        let ui = Self {
            inner: Rc::new(UiInner {
                config,
                doc: RefCell::new(doc),
                props: RefCell::new(PropertyStore::new()),
                views: RefCell::new(ViewRegistry::new()),
                attributes: RefCell::new(AttributePipeline::new()),
                mediators: RefCell::new(MediatorRegistry::new()),
                readiness: RefCell::new(Readiness::default()),
                next_hook: Cell::new(0),
            }),
        };
        if install {
            primitives::install_defaults(&ui);
        }
        ui
    }

    pub fn downgrade(&self) -> WeakUi {
        WeakUi(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Ui) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn config(&self) -> &UiConfig {
        &self.inner.config
    }
}

// =============================================================================
// Document access
// =============================================================================

impl Ui {
    /// Borrow the document. Do not hold across engine calls.
    pub fn doc(&self) -> Ref<'_, Document> {
        self.inner.doc.borrow()
    }

    /// Borrow the document mutably. Mutations made this way fire no
    /// lifecycle hooks; prefer the engine's own mutation methods.
    pub fn doc_mut(&self) -> RefMut<'_, Document> {
        self.inner.doc.borrow_mut()
    }

    pub fn root(&self) -> NodeId {
        self.inner.doc.borrow().root()
    }

    /// Parse `source` into a detached fragment.
    pub fn parse(&self, source: &str) -> Result<NodeId> {
        markup::parse_fragment(&mut self.inner.doc.borrow_mut(), source)
    }

    /// First match for `selector` under the root.
    pub fn query(&self, selector: &str) -> Result<Option<NodeId>> {
        self.query_in(self.root(), selector)
    }

    /// First match for `selector` under `scope`.
    pub fn query_in(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.doc().query_selector(scope, &selector))
    }

    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        let doc = self.doc();
        Ok(doc.query_selector_all(doc.root(), &selector))
    }

    pub fn outer_markup(&self, node: NodeId) -> String {
        markup::outer_markup(&self.doc(), node)
    }

    pub fn inner_markup(&self, node: NodeId) -> String {
        markup::inner_markup(&self.doc(), node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.doc().text_content(node)
    }

    /// Property record for `node`, created on first access.
    pub fn props(&self, node: NodeId) -> Props {
        self.inner.props.borrow_mut().get(node)
    }

    pub(crate) fn peek_props(&self, node: NodeId) -> Option<Props> {
        self.inner.props.borrow().peek(node)
    }
}

// =============================================================================
// Views
// =============================================================================

impl Ui {
    /// Define (or redefine) a view from markup.
    pub fn define_view(&self, name: &str, source: &str) -> Result<()> {
        let mut doc = self.inner.doc.borrow_mut();
        self.inner.views.borrow_mut().define_markup(&mut doc, name, source)
    }

    /// Define (or redefine) a view from an existing node, which is detached.
    pub fn define_view_node(&self, name: &str, node: NodeId) -> Result<()> {
        let mut doc = self.inner.doc.borrow_mut();
        if !doc.contains(node) {
            return Err(UiError::StaleNode(node));
        }
        self.inner.views.borrow_mut().define_node(&mut doc, name, node);
        Ok(())
    }

    /// Fresh detached copy of the view named `name`.
    pub fn clone_view(&self, name: &str) -> Result<NodeId> {
        let mut doc = self.inner.doc.borrow_mut();
        self.inner.views.borrow().clone_view(&mut doc, name)
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.inner.views.borrow().has(name)
    }

    pub fn view_names(&self) -> Vec<String> {
        self.inner.views.borrow().names()
    }
}

// =============================================================================
// Attribute processors
// =============================================================================

impl Ui {
    /// Register the processor for attribute `name`, overwriting any previous one.
    pub fn attribute(
        &self,
        name: &str,
        handler: impl Fn(&mut BindFrame<'_>, NodeId, Value) -> Result<()> + 'static,
    ) -> Result<()> {
        self.inner
            .attributes
            .borrow_mut()
            .register(name, Rc::new(handler), None)
    }

    /// Register `name` so it runs immediately before `before`.
    pub fn attribute_before(
        &self,
        name: &str,
        handler: impl Fn(&mut BindFrame<'_>, NodeId, Value) -> Result<()> + 'static,
        before: &str,
    ) -> Result<()> {
        self.inner
            .attributes
            .borrow_mut()
            .register(name, Rc::new(handler), Some(before))
    }

    /// Register named processors, each under its own name.
    pub fn attributes(&self, handlers: impl IntoIterator<Item = NamedAttribute>) -> Result<()> {
        self.inner.attributes.borrow_mut().register_all(handlers)
    }

    /// Register processors from `(name, handler)` pairs.
    pub fn attribute_map<'n>(
        &self,
        handlers: impl IntoIterator<Item = (&'n str, AttributeFn)>,
    ) -> Result<()> {
        let mut pipeline = self.inner.attributes.borrow_mut();
        for (name, handler) in handlers {
            pipeline.register(name, handler, None)?;
        }
        Ok(())
    }

    pub fn remove_attribute_processor(&self, name: &str) -> bool {
        self.inner.attributes.borrow_mut().deregister(name)
    }

    /// Current processing order.
    pub fn attribute_order(&self) -> Vec<String> {
        self.inner.attributes.borrow().order().to_vec()
    }
}

// =============================================================================
// Mediators
// =============================================================================

impl Ui {
    /// Define a mediator and return its property registration handle.
    pub fn mediator(
        &self,
        name: &str,
        handler: impl Fn(&Ui, NodeId, &Value, &Value) -> Result<Value> + 'static,
    ) -> Result<Mediator> {
        let handler: MediatorFn = Rc::new(handler);
        self.inner.mediators.borrow_mut().define(name, handler)?;
        Ok(Mediator::new(self.clone(), name))
    }

    /// Handle for an already defined mediator.
    pub fn mediator_handle(&self, name: &str) -> Result<Mediator> {
        if !self.inner.mediators.borrow().contains(name) {
            return Err(UiError::UnknownMediator(name.to_string()));
        }
        Ok(Mediator::new(self.clone(), name))
    }
}

// =============================================================================
// Node events
// =============================================================================

impl Ui {
    /// Attach `callback` as a listener for `event` on `node`.
    pub fn listen(&self, node: NodeId, event: &str, callback: Callback) {
        self.props(node)
            .borrow_mut()
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(callback);
    }

    /// Deliver `event` to the listeners on `node`, returning their results.
    pub fn fire(&self, node: NodeId, event: &str, args: &[Value]) -> Vec<Value> {
        let listeners = self
            .peek_props(node)
            .and_then(|p| p.borrow().listeners.get(event).cloned())
            .unwrap_or_default();
        listeners.iter().map(|cb| cb.call(args)).collect()
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.peek_props(node)
            .map(|p| p.borrow().listeners.get(event).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}
