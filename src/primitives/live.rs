//! Live - rebind a node whenever its source changes.
//!
//! The source is the attribute's value, or the node's context when the
//! attribute is empty:
//! - [`Dictionary`]: insert, remove and change events each rebind the node
//! - signal: an effect rebinds the node on every change after the first read
//!
//! Anything else is not observable and leaves the node static. The
//! subscription is installed once per node and released when the node leaves
//! the document or is discarded.

use std::cell::Cell;
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose, Signal};
use tracing::{debug, error, trace};

use crate::collections::{DictEvent, Dictionary};
use crate::dom::NodeId;
use crate::engine::{teardown_live, BindFrame, LiveSource, Ui, WeakUi};
use crate::error::Result;
use crate::types::Value;

/// The `live` attribute processor.
pub(crate) fn live(frame: &mut BindFrame<'_>, node: NodeId, value: Value) -> Result<()> {
    let ui = frame.ui();
    let source = match value {
        Value::Null => frame.ctx().clone(),
        Value::Text(ref s) if s.is_empty() => frame.ctx().clone(),
        other => other,
    };

    let props = ui.props(node);
    if props.borrow().live.is_some() {
        return Ok(());
    }

    let installed = match source {
        Value::Dict(dict) => watch_dictionary(ui.downgrade(), node, dict),
        Value::Signal(signal) => watch_signal(ui.downgrade(), node, signal),
        other => {
            trace!(node = ?node, source = other.type_name(), "live source is not observable");
            return Ok(());
        }
    };
    let registered = {
        let mut props = props.borrow_mut();
        props.live = Some(installed);
        props.live_hook.is_some()
    };

    if !registered {
        let hook = ui.on_removed(node, |ui: &Ui, node| {
            if let Some(props) = ui.peek_props(node) {
                teardown_live(&props);
            }
        });
        props.borrow_mut().live_hook = Some(hook);
    }
    debug!(node = ?node, "live binding installed");
    Ok(())
}

fn watch_dictionary(ui: WeakUi, node: NodeId, dict: Dictionary) -> LiveSource {
    let subscriptions = [DictEvent::Insert, DictEvent::Remove, DictEvent::Change]
        .into_iter()
        .map(|event| {
            let ui = ui.clone();
            dict.on(event, move |_, _| refresh(&ui, node))
        })
        .collect();
    LiveSource::Dictionary { dict, subscriptions }
}

fn watch_signal(ui: WeakUi, node: NodeId, signal: Signal<Value>) -> LiveSource {
    let scope = effect_scope(false);
    let first = Rc::new(Cell::new(true));

    scope.run(move || {
        let _effect_cleanup = effect(move || {
            // Read to track
            let _ = signal.get();
            if first.replace(false) {
                return;
            }
            refresh(&ui, node);
        });

        on_scope_dispose(move || {
            trace!(node = ?node, "live effect disposed");
        });
    });

    LiveSource::Signal(Box::new(move || {
        scope.stop();
    }))
}

fn refresh(ui: &WeakUi, node: NodeId) {
    let Some(ui) = ui.upgrade() else { return };
    if !ui.doc().contains(node) {
        return;
    }
    if let Err(err) = ui.rebind(node) {
        error!(node = ?node, error = %err, "live rebind failed");
    }
}
