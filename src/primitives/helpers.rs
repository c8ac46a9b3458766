//! Default attribute helpers.
//!
//! Small processors that steer a bind pass or wire callbacks onto nodes:
//!
//! ```text
//! templator="$t"     swap the templator for the rest of the node
//! with="$person"     swap the context for the rest of the node
//! if="$ok"           keep the node only when truthy (ifnot: when falsy)
//! click="$save"      attach a listener on the first pass
//! display="$show"    call once with (node, ctx) on the first pass
//! hash="items/$id"   becomes href="#items/7"
//! ```

use tracing::{debug, trace};

use crate::dom::NodeId;
use crate::engine::BindFrame;
use crate::error::{Result, UiError};
use crate::types::{Callback, Value};

/// Events the listener helpers attach.
pub(crate) const EVENT_ATTRIBUTES: [&str; 4] = ["click", "blur", "submit", "change"];

fn expect_callback(attribute: &str, value: Value) -> Result<Callback> {
    match value {
        Value::Func(callback) => Ok(callback),
        other => Err(UiError::AttributeValue {
            attribute: attribute.to_string(),
            expected: "function",
            got: other.type_name(),
        }),
    }
}

pub(crate) fn templator(frame: &mut BindFrame<'_>, _node: NodeId, value: Value) -> Result<()> {
    match value {
        Value::Templator(templator) => {
            frame.set_templator(templator);
            Ok(())
        }
        other => Err(UiError::AttributeValue {
            attribute: "templator".into(),
            expected: "templator",
            got: other.type_name(),
        }),
    }
}

pub(crate) fn with(frame: &mut BindFrame<'_>, _node: NodeId, value: Value) -> Result<()> {
    frame.set_ctx(value);
    Ok(())
}

/// Shared body of `if` and `ifnot`.
fn conditional(frame: &mut BindFrame<'_>, node: NodeId, value: Value, name: &str, keep_when: bool) {
    let ui = frame.ui();
    let value = match value {
        Value::Func(f) => f.call(&[Value::Node(node), frame.ctx().clone()]),
        other => other,
    };
    ui.doc_mut().remove_attribute(node, name);
    if value.is_truthy() != keep_when {
        trace!(node = ?node, attribute = name, "condition failed, discarding");
        ui.discard(node);
        frame.stop();
    }
}

pub(crate) fn if_(frame: &mut BindFrame<'_>, node: NodeId, value: Value) -> Result<()> {
    conditional(frame, node, value, "if", true);
    Ok(())
}

pub(crate) fn ifnot(frame: &mut BindFrame<'_>, node: NodeId, value: Value) -> Result<()> {
    conditional(frame, node, value, "ifnot", false);
    Ok(())
}

/// Processor attaching the value as a listener for `event`.
pub(crate) fn listener(
    event: &'static str,
) -> impl Fn(&mut BindFrame<'_>, NodeId, Value) -> Result<()> + 'static {
    move |frame, node, value| {
        let callback = expect_callback(event, value)?;
        if frame.first_pass() {
            frame.ui().listen(node, event, callback);
            debug!(node = ?node, event, "listener attached");
        }
        Ok(())
    }
}

pub(crate) fn display(frame: &mut BindFrame<'_>, node: NodeId, value: Value) -> Result<()> {
    let callback = expect_callback("display", value)?;
    if frame.first_pass() {
        callback.call(&[Value::Node(node), frame.ctx().clone()]);
    }
    Ok(())
}

pub(crate) fn hash(frame: &mut BindFrame<'_>, node: NodeId, value: Value) -> Result<()> {
    let mut doc = frame.ui().doc_mut();
    doc.remove_attribute(node, "hash");
    doc.set_attribute(node, "href", &format!("#{}", value.to_display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::engine::Ui;
    use crate::template::Templator;

    fn mount(ui: &Ui, source: &str) -> NodeId {
        let frag = ui.parse(source).unwrap();
        let first = ui.doc().first_child(frag).unwrap();
        ui.append_child(ui.root(), frag).unwrap();
        first
    }

    #[test]
    fn test_if_and_ifnot() {
        let ui = Ui::new();
        let node = mount(&ui, r#"<div><p if="$show">a</p><p ifnot="$show">b</p><p if="$check">c</p></div>"#);
        let check = Callback::new(|args| Value::Bool(matches!(args.first(), Some(Value::Node(_)))));
        let ctx = Value::record([("show", Value::Bool(true)), ("check", Value::Func(check))]);
        ui.bind(node, Some(ctx), None).unwrap();
        assert_eq!(ui.outer_markup(node), "<div><p>a</p><p>c</p></div>");
    }

    #[test]
    fn test_with_and_templator_swap() {
        let ui = Ui::new();
        let node = mount(
            &ui,
            r#"<div><span with="$person">$name</span><em templator="$upper">quiet</em></div>"#,
        );
        let upper = Templator::new(|src, _| Value::from(src.to_uppercase()));
        let ctx = Value::record([
            ("person", Value::record([("name", "Ada")])),
            ("upper", Value::Templator(upper)),
        ]);
        ui.bind(node, Some(ctx), None).unwrap();
        assert_eq!(ui.text_content(node), "AdaQUIET");
    }

    #[test]
    fn test_templator_rejects_other_values() {
        let ui = Ui::new();
        let node = mount(&ui, r#"<p templator="$x"></p>"#);
        let err = ui.bind(node, Some(Value::record([("x", 1)])), None).unwrap_err();
        assert!(matches!(err, UiError::AttributeValue { expected: "templator", .. }));
    }

    #[test]
    fn test_click_attaches_once() {
        let ui = Ui::new();
        let node = mount(&ui, r#"<button click="$save">Save</button>"#);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let save = Callback::named("save", move |_| {
            h.set(h.get() + 1);
            Value::Null
        });
        let ctx = Value::record([("save", Value::Func(save))]);
        ui.bind(node, Some(ctx.clone()), None).unwrap();
        ui.bind(node, Some(ctx), None).unwrap();

        assert_eq!(ui.listener_count(node, "click"), 1);
        ui.fire(node, "click", &[]);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_event_helpers_require_functions() {
        let ui = Ui::new();
        let node = mount(&ui, r#"<form submit="$nope"></form>"#);
        let err = ui.bind(node, Some(Value::record([("nope", "text")])), None).unwrap_err();
        assert!(matches!(
            err,
            UiError::AttributeValue { ref attribute, expected: "function", got: "string" } if attribute == "submit"
        ));
    }

    #[test]
    fn test_display_runs_on_first_pass() {
        let ui = Ui::new();
        let node = mount(&ui, r#"<p display="$shown">x</p>"#);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let shown = Callback::new(move |args| {
            s.borrow_mut().push(args[1].get("tag"));
            Value::Null
        });
        let ctx = Value::record([("shown", Value::Func(shown)), ("tag", Value::from("p"))]);
        ui.bind(node, Some(ctx.clone()), None).unwrap();
        ui.bind(node, Some(ctx), None).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::from("p")]);
    }

    #[test]
    fn test_hash_sets_href() {
        let ui = Ui::new();
        let node = mount(&ui, r#"<a hash="items/$id">open</a>"#);
        ui.bind(node, Some(Value::record([("id", 7)])), None).unwrap();
        assert_eq!(ui.outer_markup(node), r##"<a href="#items/7">open</a>"##);
    }
}
