//! Repeat - one bound clone of a template per collection entry.
//!
//! ```text
//! <ul><li repeat="$people">$name</li></ul>
//!
//! <ul>
//!   <!--start of $people repeat-->
//!   <li>Ada</li>
//!   <li>Grace</li>
//!   <!--end of $people repeat-->
//! </ul>
//! ```
//!
//! # Lifecycle
//!
//! - init: sentinels go where the template stood, every entry is cloned,
//!   bound and placed before the end sentinel, the template is detached
//! - insert(key): clone placed before the clone of the next key in the
//!   collection's current order (end sentinel when last)
//! - remove(key): the key's clone is discarded
//! - change(key): remove then insert, so the clone is always replaced
//! - collection swapped: the start sentinel's rebind callback sees a different
//!   collection, tears everything down and rebuilds
//! - parent removed from the document: event subscriptions are released
//!
//! Only a [`Dictionary`] reports changes. Lists and records are rendered once
//! per collection value.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bitflags::bitflags;
use tracing::{debug, error, warn};

use crate::collections::{DictEvent, Dictionary, Subscription};
use crate::dom::NodeId;
use crate::engine::{BindFrame, Ui, WeakUi};
use crate::error::{Result, UiError};
use crate::template::Templator;
use crate::types::Value;

bitflags! {
    /// Events whose teardown hook is registered on the end sentinel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct Registrations: u8 {
        const INSERT = 1 << 0;
        const REMOVE = 1 << 1;
        const CHANGE = 1 << 2;
    }
}

impl Registrations {
    fn of(event: DictEvent) -> Self {
        match event {
            DictEvent::Insert => Self::INSERT,
            DictEvent::Remove => Self::REMOVE,
            DictEvent::Change => Self::CHANGE,
        }
    }
}

const EVENTS: [DictEvent; 3] = [DictEvent::Insert, DictEvent::Remove, DictEvent::Change];

struct Repeater {
    ui: WeakUi,
    template: NodeId,
    token: String,
    templator: Templator,
    collection: Value,
    index: HashMap<String, NodeId>,
    end: NodeId,
    subscriptions: Vec<Subscription>,
    registrations: Registrations,
}

type Shared = Rc<RefCell<Repeater>>;

impl Drop for Repeater {
    fn drop(&mut self) {
        if let Value::Dict(dict) = &self.collection {
            for sub in self.subscriptions.drain(..) {
                dict.off(sub);
            }
        }
        if let Some(ui) = self.ui.upgrade() {
            ui.discard(self.template);
        }
    }
}

/// The `repeat` attribute processor.
pub(crate) fn repeat(frame: &mut BindFrame<'_>, template: NodeId, collection: Value) -> Result<()> {
    let ui = frame.ui();
    if collection.entries().is_none() {
        return Err(UiError::AttributeValue {
            attribute: "repeat".into(),
            expected: "collection",
            got: collection.type_name(),
        });
    }

    let token = ui
        .doc()
        .get_attribute(template, "repeat")
        .unwrap_or_default()
        .to_string();
    let parent = ui
        .doc()
        .parent(template)
        .ok_or_else(|| UiError::Hierarchy(format!("repeat=\"{token}\" needs a parent node")))?;

    let (start, end) = {
        let mut doc = ui.doc_mut();
        (
            doc.create_comment(&format!("start of {token} repeat")),
            doc.create_comment(&format!("end of {token} repeat")),
        )
    };
    ui.insert_before(parent, start, Some(template))?;
    ui.insert_before(parent, end, Some(template))?;
    ui.doc_mut().remove_attribute(template, "repeat");

    let repeater: Shared = Rc::new(RefCell::new(Repeater {
        ui: ui.downgrade(),
        template,
        token: token.clone(),
        templator: frame.templator().clone(),
        collection,
        index: HashMap::new(),
        end,
        subscriptions: Vec::new(),
        registrations: Registrations::empty(),
    }));

    populate(&repeater, ui, Some(&*frame))?;
    ui.remove(template);
    subscribe(&repeater, ui);

    ui.props(start).borrow_mut().rebind = Some(Rc::new(move |frame: &mut BindFrame<'_>| {
        rebind(&repeater, frame)
    }));
    debug!(token = %token, parent = ?parent, "repeat initialized");

    frame.stop();
    Ok(())
}

/// Clone, bind and place every entry of the current collection.
fn populate(this: &Shared, ui: &Ui, frame: Option<&BindFrame<'_>>) -> Result<()> {
    let (entries, end, templator) = {
        let r = this.borrow();
        (r.collection.entries().unwrap_or_default(), r.end, r.templator.clone())
    };
    for (key, value) in entries {
        let clone = place(this, ui, &key, value.clone(), end)?;
        match frame {
            Some(frame) => frame.bind_nested(clone, value)?,
            None => ui.bind(clone, Some(value), Some(templator.clone()))?,
        }
    }
    Ok(())
}

/// Clone the template for `key` and insert it before `reference`.
fn place(this: &Shared, ui: &Ui, key: &str, value: Value, reference: NodeId) -> Result<NodeId> {
    let template = this.borrow().template;
    let clone = ui.doc_mut().deep_clone(template)?;
    ui.props(clone).borrow_mut().scope = Some(value);

    let parent = ui.doc().parent(reference).ok_or_else(|| {
        UiError::Hierarchy(format!("repeat sentinel for key {key:?} is detached"))
    })?;
    ui.insert_before(parent, clone, Some(reference))?;

    if let Some(duplicate) = this.borrow_mut().index.insert(key.to_string(), clone) {
        warn!(key = %key, "repeat key already indexed, dropping old clone");
        ui.discard(duplicate);
    }
    Ok(clone)
}

// =============================================================================
// Collection events
// =============================================================================

fn subscribe(this: &Shared, ui: &Ui) {
    let Value::Dict(dict) = this.borrow().collection.clone() else {
        return;
    };
    let subscriptions: Vec<Subscription> = EVENTS.iter().map(|&e| listen(this, &dict, e)).collect();

    // The sentinel leaves the document with whichever node holds the region
    let (end, missing) = {
        let mut r = this.borrow_mut();
        r.subscriptions = subscriptions;
        let missing: Vec<DictEvent> = EVENTS
            .into_iter()
            .filter(|&e| !r.registrations.contains(Registrations::of(e)))
            .collect();
        for &event in &missing {
            r.registrations.insert(Registrations::of(event));
        }
        (r.end, missing)
    };

    for event in missing {
        let weak = Rc::downgrade(this);
        ui.on_removed(end, move |_, _| {
            if let Some(this) = weak.upgrade() {
                unsubscribe(&this, Some(event));
            }
        });
    }
}

fn listen(this: &Shared, dict: &Dictionary, event: DictEvent) -> Subscription {
    let weak = Rc::downgrade(this);
    dict.on(event, move |key, dict| {
        let Some(this) = weak.upgrade() else { return };
        let Some(ui) = this.borrow().ui.upgrade() else { return };
        let result = match event {
            DictEvent::Insert => insert(&this, &ui, key, dict),
            DictEvent::Remove => {
                remove(&this, &ui, key);
                Ok(())
            }
            DictEvent::Change => {
                remove(&this, &ui, key);
                insert(&this, &ui, key, dict)
            }
        };
        if let Err(err) = result {
            error!(key = %key, event = ?event, error = %err, "repeat update failed");
        }
    })
}

/// Release subscriptions for `event`, or all of them.
fn unsubscribe(this: &Shared, event: Option<DictEvent>) {
    let (collection, released) = {
        let mut r = this.borrow_mut();
        let (released, kept): (Vec<_>, Vec<_>) = r
            .subscriptions
            .drain(..)
            .partition(|s| event.is_none_or(|e| s.event() == e));
        r.subscriptions = kept;
        (r.collection.clone(), released)
    };
    if let Value::Dict(dict) = collection {
        for sub in released {
            dict.off(sub);
        }
    }
}

fn insert(this: &Shared, ui: &Ui, key: &str, dict: &Dictionary) -> Result<()> {
    if this.borrow().index.contains_key(key) {
        remove(this, ui, key);
    }
    let value = dict.get(key).unwrap_or_default();
    let keys = dict.keys();

    let (reference, templator) = {
        let r = this.borrow();
        let after = keys.iter().position(|k| k == key).map_or(keys.len(), |i| i + 1);
        let reference = keys[after..]
            .iter()
            .find_map(|k| r.index.get(k).copied())
            .unwrap_or(r.end);
        (reference, r.templator.clone())
    };

    let clone = place(this, ui, key, value.clone(), reference)?;
    debug!(key = %key, clone = ?clone, "repeat insert");
    ui.bind(clone, Some(value), Some(templator))
}

fn remove(this: &Shared, ui: &Ui, key: &str) {
    let removed = this.borrow_mut().index.remove(key);
    if let Some(clone) = removed {
        debug!(key = %key, clone = ?clone, "repeat remove");
        ui.discard(clone);
    }
}

// =============================================================================
// Rebind
// =============================================================================

/// Start sentinel callback: rebuild when the collection itself changed.
fn rebind(this: &Shared, frame: &mut BindFrame<'_>) -> Result<()> {
    let (token, templator, old, end) = {
        let r = this.borrow();
        (r.token.clone(), r.templator.clone(), r.collection.clone(), r.end)
    };
    let next = templator.apply(&token, frame.ctx());
    if next.same(&old) {
        return Ok(());
    }
    if next.entries().is_none() {
        warn!(token = %token, got = next.type_name(), "repeat collection is not iterable, rendering nothing");
    }

    let ui = frame.ui();
    unsubscribe(this, None);
    let clones: Vec<NodeId> = this.borrow_mut().index.drain().map(|(_, n)| n).collect();
    for clone in clones {
        ui.discard(clone);
    }

    this.borrow_mut().collection = next;
    populate(this, ui, Some(&*frame))?;
    subscribe(this, ui);

    // Fresh clones are bound; the parent resumes after the region
    frame.skip_to(Some(end));
    debug!(token = %token, "repeat rebuilt for new collection");
    Ok(())
}
