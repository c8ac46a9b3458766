//! Default mediators: `templator`, `view` and `viewmethod`.
//!
//! ```text
//! <div templator="templator.upper">     property: fn(node, ctx) -> templator
//! <a click="view.detail">               property: "detail > #main" or fn(node, ctx)
//! <button click="viewmethod.archive">   property: fn(node, ctx, args...)
//! ```

use tracing::error;

use crate::dom::NodeId;
use crate::engine::Ui;
use crate::error::{Result, UiError};
use crate::types::{Callback, Value};

fn expect_function(mediator: &str, property: &Value) -> Result<Callback> {
    property.as_callback().cloned().ok_or_else(|| UiError::AttributeValue {
        attribute: mediator.to_string(),
        expected: "function",
        got: property.type_name(),
    })
}

pub(crate) fn templator(_ui: &Ui, node: NodeId, ctx: &Value, property: &Value) -> Result<Value> {
    let build = expect_function("templator", property)?;
    match build.call(&[Value::Node(node), ctx.clone()]) {
        templator @ Value::Templator(_) => Ok(templator),
        other => Err(UiError::AttributeValue {
            attribute: "templator".into(),
            expected: "templator",
            got: other.type_name(),
        }),
    }
}

/// Resolve a `view` property into a render string and its context.
fn render_target(node: NodeId, ctx: &Value, property: &Value) -> Result<(String, Value)> {
    let generated = match property {
        Value::Func(generate) => generate.call(&[Value::Node(node), ctx.clone()]),
        other => other.clone(),
    };
    match generated {
        Value::Text(view) => Ok((view.to_string(), ctx.clone())),
        target @ (Value::Map(_) | Value::Dict(_)) => match target.get("view") {
            Value::Text(view) => {
                let view_ctx = match target.get("ctx") {
                    Value::Null => ctx.clone(),
                    given => given,
                };
                Ok((view.to_string(), view_ctx))
            }
            _ => Err(UiError::Handler(
                "An invalid view was given or generated".into(),
            )),
        },
        _ => Err(UiError::Handler(
            "An invalid view was given or generated".into(),
        )),
    }
}

pub(crate) fn view(ui: &Ui, node: NodeId, ctx: &Value, property: &Value) -> Result<Value> {
    if !matches!(property, Value::Text(_) | Value::Func(_) | Value::Map(_)) {
        return Err(UiError::AttributeValue {
            attribute: "view".into(),
            expected: "render string or function",
            got: property.type_name(),
        });
    }
    let weak = ui.downgrade();
    let ctx = ctx.clone();
    let property = property.clone();
    Ok(Value::Func(Callback::named("view", move |_| {
        let Some(ui) = weak.upgrade() else {
            return Value::Null;
        };
        let result = render_target(node, &ctx, &property)
            .and_then(|(view, view_ctx)| ui.render(&[view.as_str()], view_ctx));
        if let Err(err) = result {
            error!(node = ?node, error = %err, "view mediator render failed");
        }
        Value::Null
    })))
}

pub(crate) fn viewmethod(_ui: &Ui, node: NodeId, ctx: &Value, property: &Value) -> Result<Value> {
    let method = expect_function("viewmethod", property)?;
    let ctx = ctx.clone();
    let name = method.name().to_string();
    Ok(Value::Func(Callback::named(&name, move |args| {
        let mut full = Vec::with_capacity(args.len() + 2);
        full.push(Value::Node(node));
        full.push(ctx.clone());
        full.extend_from_slice(args);
        method.call(&full)
    })))
}
