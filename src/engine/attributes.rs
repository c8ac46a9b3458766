//! Attribute Pipeline - named attribute processors and their order.
//!
//! Order is best effort: `register(name, f, Some(before))` inserts `name`
//! right before `before` as it stands at registration time, or appends when
//! `before` is unknown. Later registrations are free to break earlier
//! constraints; no transitive ordering is attempted.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::dom::NodeId;
use crate::error::{Result, UiError};
use crate::types::Value;

use super::frame::BindFrame;

/// Processor signature: `(frame, node, resolved value)`.
///
/// The frame carries the current context and templator and lets the
/// processor stop the traversal or defer work until the node is done.
pub type AttributeFn = Rc<dyn Fn(&mut BindFrame<'_>, NodeId, Value) -> Result<()>>;

/// A processor with its registration name.
#[derive(Clone)]
pub struct NamedAttribute {
    pub name: String,
    pub handler: AttributeFn,
}

impl NamedAttribute {
    pub fn new(
        name: &str,
        handler: impl Fn(&mut BindFrame<'_>, NodeId, Value) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            handler: Rc::new(handler),
        }
    }
}

#[derive(Default)]
pub struct AttributePipeline {
    handlers: HashMap<String, AttributeFn>,
    order: Vec<String>,
}

impl AttributePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the processor for `name`.
    ///
    /// Names are case-insensitive. Overwriting keeps the existing position
    /// unless `before` asks for a new one.
    pub fn register(&mut self, name: &str, handler: AttributeFn, before: Option<&str>) -> Result<()> {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(UiError::InvalidAttributeName);
        }
        let before = before.map(str::to_ascii_lowercase);

        let existing = self.order.iter().position(|n| *n == name);
        match (existing, before) {
            (Some(_), None) => {}
            (existing, before) => {
                if let Some(at) = existing {
                    self.order.remove(at);
                }
                let at = before
                    .and_then(|b| self.order.iter().position(|n| *n == b))
                    .unwrap_or(self.order.len());
                self.order.insert(at, name.clone());
            }
        }

        debug!(attribute = %name, "attribute processor registered");
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Register each handler under its own name.
    pub fn register_all(&mut self, handlers: impl IntoIterator<Item = NamedAttribute>) -> Result<()> {
        for NamedAttribute { name, handler } in handlers {
            if name.trim().is_empty() {
                return Err(UiError::MissingHandler(
                    "Attribute handler must have a name".into(),
                ));
            }
            self.register(&name, handler, None)?;
        }
        Ok(())
    }

    /// Drop the processor for `name`. Returns whether one was registered.
    pub fn deregister(&mut self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.order.retain(|n| *n != name);
        self.handlers.remove(&name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<AttributeFn> {
        self.handlers.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    fn rank(&self, name: &str) -> usize {
        self.order
            .iter()
            .position(|n| n == name)
            .unwrap_or(self.order.len())
    }

    /// Sort attribute names into processing order: registered names by
    /// registration position, then unregistered names as they appeared.
    pub fn sort(&self, names: &mut [String]) {
        names.sort_by_key(|n| self.rank(n));
    }
}
