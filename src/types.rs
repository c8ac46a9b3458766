//! Core types - the data a view is bound against.
//!
//! A bind context is a dynamic [`Value`]. Records, lists, observable
//! dictionaries, signals, callables and nodes can all appear in it, and the
//! templator walks paths through any of them.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use spark_signals::Signal;

use crate::collections::Dictionary;
use crate::dom::NodeId;
use crate::template::Templator;

// =============================================================================
// Callback
// =============================================================================

/// A callable value, optionally named.
///
/// The name plays the role of a function's declared name: registration calls
/// that take lists of handlers derive the registered name from it.
#[derive(Clone)]
pub struct Callback {
    name: Rc<str>,
    func: Rc<dyn Fn(&[Value]) -> Value>,
}

impl Callback {
    /// Anonymous callback.
    pub fn new(func: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self::named("", func)
    }

    pub fn named(name: &str, func: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// Declared name (empty for anonymous callbacks).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "Callback(<anonymous>)")
        } else {
            write!(f, "Callback({})", self.name)
        }
    }
}

// =============================================================================
// Value
// =============================================================================

/// Dynamic value flowing through contexts, templators and processors.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    List(Rc<Vec<Value>>),
    Map(Rc<IndexMap<String, Value>>),
    /// Observable keyed collection.
    Dict(Dictionary),
    /// Reactive cell; reads go through `Signal::get`.
    Signal(Signal<Value>),
    Func(Callback),
    Node(NodeId),
    Templator(Templator),
}

impl Value {
    /// Build a record from `(key, value)` pairs.
    pub fn record<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Runtime type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "record",
            Value::Dict(_) => "dictionary",
            Value::Signal(_) => "signal",
            Value::Func(_) => "function",
            Value::Node(_) => "node",
            Value::Templator(_) => "templator",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Signal(s) => s.get().is_truthy(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    /// Read through a signal; every other value is returned as is.
    pub fn current(&self) -> Value {
        match self {
            Value::Signal(s) => s.get(),
            other => other.clone(),
        }
    }

    /// Look up one path segment.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Map(map) => map.get(key).cloned().unwrap_or_default(),
            Value::Dict(dict) => dict.get(key).unwrap_or_default(),
            Value::List(items) => match key {
                "length" => Value::Number(items.len() as f64),
                _ => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default(),
            },
            Value::Text(s) if key == "length" => Value::Number(s.chars().count() as f64),
            Value::Signal(s) => s.get().get(key),
            _ => Value::Null,
        }
    }

    /// Look up a dotted path such as `person.address.city`.
    pub fn path(&self, path: &str) -> Value {
        path.split('.')
            .filter(|seg| !seg.is_empty())
            .fold(self.clone(), |value, seg| value.get(seg))
    }

    /// Reference identity for shared values, equality for scalars.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Templator(a), Value::Templator(b)) => a.ptr_eq(b),
            _ => self == other,
        }
    }

    /// `(key, value)` entries when the value is iterable as a collection.
    pub fn entries(&self) -> Option<Vec<(String, Value)>> {
        match self {
            Value::List(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.clone()))
                    .collect(),
            ),
            Value::Map(map) => Some(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            Value::Dict(dict) => Some(dict.entries()),
            Value::Signal(s) => s.get().entries(),
            _ => None,
        }
    }

    /// Text used when the value lands in a text node or attribute.
    pub fn to_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_display)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) | Value::Dict(_) => "[object]".to_string(),
            Value::Signal(s) => s.get().to_display(),
            Value::Func(f) => format!("[function {}]", f.name()),
            Value::Node(_) => "[node]".to_string(),
            Value::Templator(_) => "[templator]".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Dict(a), Value::Dict(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Templator(a), Value::Templator(b)) => a.ptr_eq(b),
            // Signals carry no comparable identity
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Dict(dict) => write!(f, "Dict({:?})", dict.keys()),
            Value::Signal(_) => write!(f, "Signal(..)"),
            Value::Func(cb) => write!(f, "{cb:?}"),
            Value::Node(id) => write!(f, "Node({id:?})"),
            Value::Templator(_) => write!(f, "Templator(..)"),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Rc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(Rc::new(map))
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dict(dict)
    }
}

impl From<Signal<Value>> for Value {
    fn from(signal: Signal<Value>) -> Self {
        Value::Signal(signal)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Func(cb)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<Templator> for Value {
    fn from(t: Templator) -> Self {
        Value::Templator(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_lookup() {
        let ctx = Value::record([
            ("name", Value::from("Ada")),
            (
                "address",
                Value::record([("city", "London")]),
            ),
            ("tags", Value::list(["a", "b"])),
        ]);

        assert_eq!(ctx.path("name"), Value::from("Ada"));
        assert_eq!(ctx.path("address.city"), Value::from("London"));
        assert_eq!(ctx.path("tags.1"), Value::from("b"));
        assert_eq!(ctx.path("tags.length"), Value::from(2));
        assert!(ctx.path("missing.deeper").is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(7).to_display(), "7");
        assert_eq!(Value::from(2.5).to_display(), "2.5");
        assert_eq!(Value::Null.to_display(), "");
        assert_eq!(Value::list([1, 2]).to_display(), "1,2");
    }

    #[test]
    fn test_same_uses_identity_for_shared_values() {
        let a = Value::list([1, 2]);
        let b = Value::list([1, 2]);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
        assert_eq!(a, b);
        assert!(Value::from(3).same(&Value::from(3)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::list(Vec::<Value>::new()).is_truthy());
    }

    #[test]
    fn test_callback_name() {
        let cb = Callback::named("save", |_| Value::Null);
        assert_eq!(cb.name(), "save");
        assert_eq!(Callback::new(|_| Value::Null).name(), "");
    }
}
