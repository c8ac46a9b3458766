//! Mediator Registry - the `mediator.property` indirection.
//!
//! A mediator is a write-once handler plus a table of named properties. An
//! attribute value of exactly `word.word` whose mediator and property both
//! exist resolves to `handler(node, ctx, property)`; anything else is handed
//! to the templator verbatim.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dom::NodeId;
use crate::error::{Result, UiError};
use crate::types::{Callback, Value};

use super::ui::Ui;

/// Mediator handler: `(ui, node, ctx, property) -> value`.
pub type MediatorFn = Rc<dyn Fn(&Ui, NodeId, &Value, &Value) -> Result<Value>>;

/// An attribute value, classified once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue<'a> {
    Literal(&'a str),
    MediatorRef { mediator: &'a str, property: &'a str },
}

static MEDIATOR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_]+)\.([A-Za-z0-9_]+)$").unwrap());

impl<'a> AttrValue<'a> {
    pub fn parse(src: &'a str) -> Self {
        match MEDIATOR_REF.captures(src) {
            Some(caps) => match (caps.get(1), caps.get(2)) {
                (Some(m), Some(p)) => AttrValue::MediatorRef {
                    mediator: m.as_str(),
                    property: p.as_str(),
                },
                _ => AttrValue::Literal(src),
            },
            None => AttrValue::Literal(src),
        }
    }
}

struct MediatorEntry {
    handler: MediatorFn,
    properties: HashMap<String, Value>,
}

#[derive(Default)]
pub struct MediatorRegistry {
    mediators: HashMap<String, MediatorEntry>,
}

impl MediatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a mediator. Names are write-once.
    pub fn define(&mut self, name: &str, handler: MediatorFn) -> Result<()> {
        if name.is_empty() {
            return Err(UiError::InvalidMediatorName);
        }
        if self.mediators.contains_key(name) {
            return Err(UiError::DuplicateMediator(name.to_string()));
        }
        self.mediators.insert(
            name.to_string(),
            MediatorEntry {
                handler,
                properties: HashMap::new(),
            },
        );
        debug!(mediator = %name, "mediator defined");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mediators.contains_key(name)
    }

    /// Register `property` on `mediator`, replacing any previous value.
    pub fn set_property(&mut self, mediator: &str, property: &str, value: Value) -> Result<()> {
        let entry = self
            .mediators
            .get_mut(mediator)
            .ok_or_else(|| UiError::UnknownMediator(mediator.to_string()))?;
        entry.properties.insert(property.to_string(), value);
        debug!(mediator = %mediator, property = %property, "mediator property set");
        Ok(())
    }

    pub fn property(&self, mediator: &str, property: &str) -> Option<Value> {
        self.mediators.get(mediator)?.properties.get(property).cloned()
    }

    /// Handler and raw property value for a reference, if both exist.
    pub fn resolve(&self, mediator: &str, property: &str) -> Option<(MediatorFn, Value)> {
        let entry = self.mediators.get(mediator)?;
        let value = entry.properties.get(property)?.clone();
        Some((entry.handler.clone(), value))
    }
}

// =============================================================================
// Mediator handle
// =============================================================================

/// Property registration handle returned by [`Ui::mediator`].
#[derive(Clone)]
pub struct Mediator {
    ui: Ui,
    name: String,
}

impl Mediator {
    pub(crate) fn new(ui: Ui, name: &str) -> Self {
        Self {
            ui,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register one property. The name must be text.
    pub fn set(&self, property: impl Into<Value>, value: impl Into<Value>) -> Result<&Self> {
        let property = property.into();
        let Some(key) = property.as_str() else {
            return Err(UiError::InvalidPropertyName {
                mediator: self.name.clone(),
                got: property.type_name(),
            });
        };
        self.ui
            .inner
            .mediators
            .borrow_mut()
            .set_property(&self.name, key, value.into())?;
        Ok(self)
    }

    /// Register a callback under its declared name.
    pub fn named(&self, callback: Callback) -> Result<&Self> {
        if callback.name().is_empty() {
            return Err(UiError::MissingHandler(format!(
                "Mediator {} property function must have a name",
                self.name
            )));
        }
        let name = callback.name().to_string();
        self.set(name, callback)
    }

    /// Register several callbacks, each under its declared name.
    pub fn functions(&self, callbacks: impl IntoIterator<Item = Callback>) -> Result<&Self> {
        for callback in callbacks {
            self.named(callback)?;
        }
        Ok(self)
    }

    /// Bulk registration from `(name, value)` pairs.
    pub fn extend<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<&Self>
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        for (k, v) in entries {
            self.set(k, v)?;
        }
        Ok(self)
    }

    pub fn get(&self, property: &str) -> Option<Value> {
        self.ui.inner.mediators.borrow().property(&self.name, property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo() -> MediatorFn {
        Rc::new(|_, _, _, prop| Ok(prop.clone()))
    }

    #[test]
    fn test_attr_value_grammar() {
        assert_eq!(
            AttrValue::parse("form.save"),
            AttrValue::MediatorRef {
                mediator: "form",
                property: "save"
            }
        );
        let literals = [
            "form", "form.save.now", "$x.y", "form .save", "a.b ", "", "café.save", "form.sauvé",
        ];
        for literal in literals {
            assert_eq!(AttrValue::parse(literal), AttrValue::Literal(literal));
        }
    }

    #[test]
    fn test_define_is_write_once() {
        let mut reg = MediatorRegistry::new();
        reg.define("form", echo()).unwrap();
        assert!(matches!(
            reg.define("form", echo()),
            Err(UiError::DuplicateMediator(ref n)) if n == "form"
        ));
        assert!(matches!(reg.define("", echo()), Err(UiError::InvalidMediatorName)));
    }

    #[test]
    fn test_resolve_needs_mediator_and_property() {
        let mut reg = MediatorRegistry::new();
        reg.define("form", echo()).unwrap();
        assert!(reg.resolve("form", "save").is_none());

        reg.set_property("form", "save", Value::from("saved")).unwrap();
        let (_, value) = reg.resolve("form", "save").unwrap();
        assert_eq!(value, Value::from("saved"));
        assert!(reg.resolve("other", "save").is_none());
        assert!(matches!(
            reg.set_property("other", "x", Value::Null),
            Err(UiError::UnknownMediator(_))
        ));
    }

    fn form(ui: &Ui) -> Mediator {
        ui.mediator("form", |_, _, _, prop| Ok(prop.clone())).unwrap()
    }

    #[test]
    fn test_property_name_must_be_text() {
        let ui = Ui::new();
        let form = form(&ui);
        let err = form.set(3, "x").map(|_| ()).unwrap_err();
        assert!(matches!(
            err,
            UiError::InvalidPropertyName { ref mediator, got: "number" } if mediator == "form"
        ));
        assert!(err.to_string().contains("form"));

        let err = form.set(Value::Null, "x").map(|_| ()).unwrap_err();
        assert!(matches!(err, UiError::InvalidPropertyName { got: "null", .. }));
    }

    #[test]
    fn test_named_requires_a_name() {
        let ui = Ui::new();
        let form = form(&ui);
        let err = form
            .named(Callback::new(|_| Value::Null))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, UiError::MissingHandler(ref m) if m.contains("form")));
        assert!(form.get("").is_none());
    }

    #[test]
    fn test_functions_register_under_declared_names() {
        let ui = Ui::new();
        let form = form(&ui);
        let save = Callback::named("save", |_| Value::from("saved"));
        let load = Callback::named("load", |_| Value::from("loaded"));
        form.functions([save.clone(), load.clone()]).unwrap();

        assert_eq!(form.get("save"), Some(Value::Func(save)));
        assert_eq!(form.get("load"), Some(Value::Func(load)));

        // Registration stops at the first anonymous callback
        let err = form
            .functions([Callback::named("reset", |_| Value::Null), Callback::new(|_| Value::Null)])
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, UiError::MissingHandler(_)));
        assert!(form.get("reset").is_some());
    }

    #[test]
    fn test_extend_registers_pairs() {
        let ui = Ui::new();
        let form = form(&ui);
        form.extend([("title", Value::from("Edit")), ("limit", Value::from(10))])
            .unwrap()
            .set("title", "Create")
            .unwrap();
        assert_eq!(form.get("title"), Some(Value::from("Create")));
        assert_eq!(form.get("limit"), Some(Value::from(10)));

        let err = form
            .extend([(Value::from(true), Value::Null)])
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, UiError::InvalidPropertyName { got: "boolean", .. }));
    }
}
