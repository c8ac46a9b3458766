//! Rendering views through the public engine API.

use std::cell::RefCell;
use std::rc::Rc;

use spark_view::{Callback, NodeId, Ui, UiConfig, UiError, Value};

fn ready(markup: &str) -> Ui {
    let ui = Ui::from_markup(markup).unwrap();
    ui.ready().unwrap();
    ui
}

#[test]
fn test_cloned_views_are_independent() {
    let ui = Ui::new();
    ui.define_view("row", "<tr><td>$$</td></tr>").unwrap();

    let a = ui.clone_view("row").unwrap();
    let b = ui.clone_view("row").unwrap();
    assert_ne!(a, b);
    assert_eq!(ui.outer_markup(a), ui.outer_markup(b));

    ui.bind(a, Some(Value::from("first")), None).unwrap();
    assert_eq!(ui.outer_markup(a), "<tr><td>first</td></tr>");
    assert_eq!(ui.outer_markup(b), "<tr><td>$$</td></tr>");
}

#[test]
fn test_unknown_view_names_the_view() {
    let ui = Ui::new();
    let err = ui.clone_view("ghost").unwrap_err();
    assert!(matches!(err, UiError::UnknownView(_)));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_mediator_property_resolves_through_handler() {
    let ui = Ui::new();
    let seen: Rc<RefCell<Vec<(NodeId, Value, Value)>>> = Rc::default();
    let s = seen.clone();
    ui.mediator("form", move |_, node, ctx, property| {
        s.borrow_mut().push((node, ctx.clone(), property.clone()));
        Ok(Value::from("resolved"))
    })
    .unwrap();
    let save = Callback::named("save", |_| Value::Null);
    ui.mediator_handle("form").unwrap().named(save.clone()).unwrap();

    let frag = ui.parse(r#"<button action="form.save" title="form.missing"></button>"#).unwrap();
    let button = ui.doc().first_child(frag).unwrap();
    ui.append_child(ui.root(), frag).unwrap();
    let ctx = Value::record([("id", 7)]);
    ui.bind(button, Some(ctx.clone()), None).unwrap();

    assert_eq!(*seen.borrow(), vec![(button, ctx, Value::Func(save))]);
    assert_eq!(
        ui.outer_markup(button),
        r#"<button action="resolved" title="form.missing"></button>"#
    );
}

#[test]
fn test_mediator_cannot_be_redefined() {
    let ui = Ui::new();
    ui.mediator("form", |_, _, _, p| Ok(p.clone())).unwrap();
    assert!(matches!(
        ui.mediator("form", |_, _, _, p| Ok(p.clone())),
        Err(UiError::DuplicateMediator(_))
    ));
}

#[test]
fn test_render_into_missing_target() {
    let ui = ready("<section></section>");
    ui.define_view("detail", "<p>$id</p>").unwrap();
    let err = ui
        .render(&["detail > #main"], Value::record([("id", 7)]))
        .unwrap_err();
    assert!(matches!(err, UiError::TargetNotFound(_)));
}

#[test]
fn test_renders_queue_until_ready() {
    let ui = Ui::from_markup(r#"<div id="x"></div><div id="y"></div>"#).unwrap();
    ui.define_view("a", "<b>$name</b>").unwrap();
    ui.define_view("b", "<i>$name</i>").unwrap();
    let ctx = Value::record([("name", "Ada")]);

    ui.render(&["a>#x"], ctx.clone()).unwrap();
    ui.render(&["b>#y"], ctx).unwrap();
    assert_eq!(ui.pending(), 2);

    ui.ready().unwrap();
    ui.ready().unwrap();
    assert_eq!(
        ui.inner_markup(ui.root()),
        r#"<div id="x"><b>Ada</b></div><div id="y"><i>Ada</i></div>"#
    );
}

#[test]
fn test_render_tag_pulls_in_views() {
    let ui = ready(r#"<main id="app"></main>"#);
    ui.define_view("card", r#"<article><render name="title"></render><p>$body</p></article>"#)
        .unwrap();
    ui.define_view("title", "<h2>$title</h2><hr>").unwrap();

    ui.render(
        &["card > #app"],
        Value::record([("title", "News"), ("body", "Text")]),
    )
    .unwrap();
    assert_eq!(
        ui.inner_markup(ui.id("app").unwrap()),
        "<article><h2>News</h2><hr><p>Text</p></article>"
    );
}

#[test]
fn test_views_declared_in_markup() {
    let ui = Ui::from_markup(concat!(
        r#"<ul id="list"></ul>"#,
        r#"<l-view name="item"><li class="$kind">$label</li></l-view>"#,
    ))
    .unwrap();
    ui.render(&["item >> #list"], Value::record([("kind", "a"), ("label", "one")]))
        .unwrap();
    ui.render(&["item >> #list"], Value::record([("kind", "b"), ("label", "two")]))
        .unwrap();
    ui.ready().unwrap();

    assert_eq!(
        ui.inner_markup(ui.root()),
        r#"<ul id="list"><li class="a">one</li><li class="b">two</li></ul>"#
    );
}

#[test]
fn test_custom_config_names() {
    let config = UiConfig {
        render_tag: "include".into(),
        ..Default::default()
    };
    let ui = Ui::from_markup_with_config(r#"<div id="app"></div>"#, config).unwrap();
    ui.ready().unwrap();
    ui.define_view("page", r#"<section><include name="footer"></include></section>"#)
        .unwrap();
    ui.define_view("footer", "<footer>$year</footer>").unwrap();

    ui.render(&["page > #app"], Value::record([("year", 2024)])).unwrap();
    assert_eq!(
        ui.inner_markup(ui.id("app").unwrap()),
        "<section><footer>2024</footer></section>"
    );
}

#[test]
fn test_attribute_processor_order_and_frame_control() {
    let ui = Ui::from_markup(r#"<div id="app"></div>"#).unwrap();
    ui.ready().unwrap();
    let log: Rc<RefCell<Vec<String>>> = Rc::default();

    let l = log.clone();
    ui.attribute("first", move |_, _, value| {
        l.borrow_mut().push(format!("first:{}", value.to_display()));
        Ok(())
    })
    .unwrap();
    let l = log.clone();
    ui.attribute_before(
        "zeroth",
        move |frame, _, _| {
            l.borrow_mut().push("zeroth".into());
            frame.set_ctx(Value::record([("who", "swapped")]));
            Ok(())
        },
        "first",
    )
    .unwrap();

    ui.define_view("v", r#"<p first="$who" zeroth="">$who</p>"#).unwrap();
    ui.render(&["v > #app"], Value::record([("who", "original")])).unwrap();

    assert_eq!(*log.borrow(), vec!["zeroth", "first:swapped"]);
    assert_eq!(
        ui.inner_markup(ui.id("app").unwrap()),
        r#"<p first="$who" zeroth>swapped</p>"#
    );
}
