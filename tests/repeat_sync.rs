//! Repeat regions kept in sync with dictionaries.

use spark_view::{DictEvent, Dictionary, NodeId, Ui, Value};

fn person(name: &str) -> Value {
    Value::record([("name", name)])
}

fn list_ui() -> (Ui, NodeId) {
    let ui = Ui::from_markup(r#"<ul id="people"><li repeat="$people" class="p">$name</li></ul>"#).unwrap();
    ui.ready().unwrap();
    let list = ui.id("people").unwrap();
    (ui, list)
}

fn names(ui: &Ui, list: NodeId) -> Vec<String> {
    ui.query_all("#people li")
        .unwrap()
        .into_iter()
        .filter(|&li| ui.doc().parent(li) == Some(list))
        .map(|li| ui.text_content(li))
        .collect()
}

#[test]
fn test_dictionary_order_is_tracked() {
    let (ui, list) = list_ui();
    let people = Dictionary::new();
    people.insert("k1", person("Ada"));
    people.insert("k2", person("Grace"));
    people.insert("k3", person("Linus"));
    ui.bind(list, Some(Value::record([("people", Value::Dict(people.clone()))])), None)
        .unwrap();
    assert_eq!(names(&ui, list), vec!["Ada", "Grace", "Linus"]);

    // k4 lands between k1 and k2
    people.insert_at(1, "k4", person("Barbara"));
    assert_eq!(names(&ui, list), vec!["Ada", "Barbara", "Grace", "Linus"]);

    let before: Vec<NodeId> = ui.children(list);
    people.remove("k2");
    let after: Vec<NodeId> = ui.children(list);
    assert_eq!(after.len(), before.len() - 1);
    assert!(before.iter().filter(|n| !after.contains(n)).count() == 1);
    assert_eq!(names(&ui, list), vec!["Ada", "Barbara", "Linus"]);
}

#[test]
fn test_sorted_dictionary_places_by_key() {
    let (ui, list) = list_ui();
    let people = Dictionary::sorted();
    people.insert("b", person("Grace"));
    people.insert("d", person("Linus"));
    ui.bind(list, Some(Value::record([("people", Value::Dict(people.clone()))])), None)
        .unwrap();

    people.insert("c", person("Ken"));
    people.insert("a", person("Ada"));
    assert_eq!(names(&ui, list), vec!["Ada", "Grace", "Ken", "Linus"]);
}

#[test]
fn test_clone_attributes_are_bound() {
    let (ui, list) = list_ui();
    let people = Dictionary::from_entries([("k1", person("Ada"))]);
    ui.bind(list, Some(Value::record([("people", Value::Dict(people))])), None)
        .unwrap();
    assert_eq!(
        ui.inner_markup(list),
        r#"<!--start of $people repeat--><li class="p">Ada</li><!--end of $people repeat-->"#
    );
}

#[test]
fn test_rendered_view_repeats_and_tears_down() {
    let ui = Ui::from_markup(r#"<div id="app"></div>"#).unwrap();
    ui.ready().unwrap();
    ui.define_view("roster", r#"<ol><li repeat="$$">$name</li></ol>"#).unwrap();
    let people = Dictionary::from_entries([("k1", person("Ada")), ("k2", person("Grace"))]);

    ui.render(&["roster > #app"], Value::Dict(people.clone())).unwrap();
    let app = ui.id("app").unwrap();
    assert_eq!(ui.text_content(app), "AdaGrace");

    people.insert("k3", person("Linus"));
    assert_eq!(ui.text_content(app), "AdaGraceLinus");
    assert_eq!(people.listener_count(DictEvent::Insert), 1);

    // Replacing the view drops the old region's subscriptions
    ui.define_view("empty", "<p>none</p>").unwrap();
    ui.render(&["empty > #app"], Value::Null).unwrap();
    assert_eq!(people.listener_count(DictEvent::Insert), 0);
    assert_eq!(people.listener_count(DictEvent::Change), 0);

    people.insert("k4", person("Ken"));
    assert_eq!(ui.text_content(app), "none");
}

#[test]
fn test_nested_repeat() {
    let ui = Ui::from_markup(r#"<div id="app"></div>"#).unwrap();
    ui.ready().unwrap();
    ui.define_view(
        "groups",
        r#"<section><div repeat="$groups"><h3>$title</h3><span repeat="$members">$$</span></div></section>"#,
    )
    .unwrap();
    let ctx = Value::record([(
        "groups",
        Value::list([
            Value::record([("title", Value::from("A")), ("members", Value::list(["x", "y"]))]),
            Value::record([("title", Value::from("B")), ("members", Value::list(["z"]))]),
        ]),
    )]);

    ui.render(&["groups > #app"], ctx).unwrap();
    assert_eq!(ui.text_content(ui.id("app").unwrap()), "AxyBz");
}
