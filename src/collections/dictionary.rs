//! Dictionary - ordered, keyed, observable collection.
//!
//! The collection a `repeat` attribute keeps in sync with. Three event lists:
//! - insert: a new key appeared
//! - change: an existing key got a new value
//! - remove: a key went away
//!
//! Listeners run synchronously with no borrow held, so they may read the
//! dictionary or mutate it again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::types::Value;

/// Listener signature: `(key, dictionary)`.
pub type Listener = Rc<dyn Fn(&str, &Dictionary)>;

/// Dictionary event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictEvent {
    Insert,
    Remove,
    Change,
}

#[derive(Default)]
struct Listeners {
    insert: Vec<(u64, Listener)>,
    remove: Vec<(u64, Listener)>,
    change: Vec<(u64, Listener)>,
}

impl Listeners {
    fn list_mut(&mut self, event: DictEvent) -> &mut Vec<(u64, Listener)> {
        match event {
            DictEvent::Insert => &mut self.insert,
            DictEvent::Remove => &mut self.remove,
            DictEvent::Change => &mut self.change,
        }
    }

    fn snapshot(&self, event: DictEvent) -> Vec<Listener> {
        let list = match event {
            DictEvent::Insert => &self.insert,
            DictEvent::Remove => &self.remove,
            DictEvent::Change => &self.change,
        };
        list.iter().map(|(_, l)| l.clone()).collect()
    }
}

struct DictInner {
    entries: RefCell<IndexMap<String, Value>>,
    listeners: RefCell<Listeners>,
    next_listener: Cell<u64>,
    sorted: bool,
}

/// Shared handle to an observable ordered map.
#[derive(Clone)]
pub struct Dictionary(Rc<DictInner>);

/// Handle returned by listener registration; pass to [`Dictionary::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    event: DictEvent,
    id: u64,
}

impl Subscription {
    pub fn event(&self) -> DictEvent {
        self.event
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    /// Insertion-ordered dictionary.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Dictionary that keeps its keys in lexicographic order.
    pub fn sorted() -> Self {
        Self::build(true)
    }

    fn build(sorted: bool) -> Self {
        Self(Rc::new(DictInner {
            entries: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(Listeners::default()),
            next_listener: Cell::new(0),
            sorted,
        }))
    }

    /// Build from `(key, value)` pairs without firing events.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let dict = Self::new();
        dict.0
            .entries
            .borrow_mut()
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        dict
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.entries.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in collection order.
    pub fn keys(&self) -> Vec<String> {
        self.0.entries.borrow().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Set `key`. A new key fires insert, an existing one fires change.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let event = {
            let mut entries = self.0.entries.borrow_mut();
            if let Some(slot) = entries.get_mut(&key) {
                *slot = value;
                DictEvent::Change
            } else if self.0.sorted {
                let at = entries.keys().position(|k| *k > key).unwrap_or(entries.len());
                entries.shift_insert(at, key.clone(), value);
                DictEvent::Insert
            } else {
                entries.insert(key.clone(), value);
                DictEvent::Insert
            }
        };
        self.emit(event, &key);
    }

    /// Insert a new key at `index` (clamped). An existing key is updated in
    /// place and fires change.
    pub fn insert_at(&self, index: usize, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let event = {
            let mut entries = self.0.entries.borrow_mut();
            if let Some(slot) = entries.get_mut(&key) {
                *slot = value;
                DictEvent::Change
            } else {
                let at = index.min(entries.len());
                entries.shift_insert(at, key.clone(), value);
                DictEvent::Insert
            }
        };
        self.emit(event, &key);
    }

    /// Remove `key`, firing remove when it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.0.entries.borrow_mut().shift_remove(key);
        if removed.is_some() {
            self.emit(DictEvent::Remove, key);
        }
        removed
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    pub fn on(&self, event: DictEvent, listener: impl Fn(&str, &Dictionary) + 'static) -> Subscription {
        let id = self.0.next_listener.get();
        self.0.next_listener.set(id + 1);
        self.0
            .listeners
            .borrow_mut()
            .list_mut(event)
            .push((id, Rc::new(listener)));
        Subscription { event, id }
    }

    pub fn on_insert(&self, listener: impl Fn(&str, &Dictionary) + 'static) -> Subscription {
        self.on(DictEvent::Insert, listener)
    }

    pub fn on_remove(&self, listener: impl Fn(&str, &Dictionary) + 'static) -> Subscription {
        self.on(DictEvent::Remove, listener)
    }

    pub fn on_change(&self, listener: impl Fn(&str, &Dictionary) + 'static) -> Subscription {
        self.on(DictEvent::Change, listener)
    }

    /// Deregister a listener. Returns false when it was already gone.
    pub fn off(&self, subscription: Subscription) -> bool {
        let mut listeners = self.0.listeners.borrow_mut();
        let list = listeners.list_mut(subscription.event);
        let before = list.len();
        list.retain(|(id, _)| *id != subscription.id);
        list.len() != before
    }

    pub fn listener_count(&self, event: DictEvent) -> usize {
        self.0.listeners.borrow().snapshot(event).len()
    }

    fn emit(&self, event: DictEvent, key: &str) {
        let listeners = self.0.listeners.borrow().snapshot(event);
        for listener in listeners {
            listener(key, self);
        }
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_change_remove_events() {
        let dict = Dictionary::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for event in [DictEvent::Insert, DictEvent::Change, DictEvent::Remove] {
            let log = log.clone();
            dict.on(event, move |key, _| log.borrow_mut().push(format!("{event:?}:{key}")));
        }

        dict.insert("a", 1);
        dict.insert("a", 2);
        dict.remove("a");
        dict.remove("a");

        assert_eq!(*log.borrow(), vec!["Insert:a", "Change:a", "Remove:a"]);
    }

    #[test]
    fn test_sorted_and_positional_inserts() {
        let dict = Dictionary::sorted();
        dict.insert("k3", 3);
        dict.insert("k1", 1);
        dict.insert("k2", 2);
        assert_eq!(dict.keys(), vec!["k1", "k2", "k3"]);

        let plain = Dictionary::from_entries([("a", 1), ("c", 3)]);
        plain.insert_at(1, "b", 2);
        assert_eq!(plain.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_off_stops_delivery() {
        let dict = Dictionary::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let sub = dict.on_insert(move |_, _| h.set(h.get() + 1));

        dict.insert("x", 1);
        assert!(dict.off(sub));
        assert!(!dict.off(sub));
        dict.insert("y", 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(dict.listener_count(DictEvent::Insert), 0);
    }

    #[test]
    fn test_listener_may_read_and_mutate() {
        let dict = Dictionary::new();
        dict.on_insert(|key, d| {
            assert!(d.contains_key(key));
            if key == "first" {
                d.insert("second", 2);
            }
        });
        dict.insert("first", 1);
        assert_eq!(dict.keys(), vec!["first", "second"]);
    }
}
