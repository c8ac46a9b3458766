//! Todo List Example - views, repeat and live regions
//!
//! This example walks through a small todo page:
//! - Declaring views in markup with `l-view`
//! - Rendering into the document once ready
//! - Keeping a repeat region in sync with a Dictionary
//! - A signal-backed counter re-bound by `live`
//! - Buttons wired through the `viewmethod` mediator
//!
//! Run with: RUST_LOG=spark_view=debug cargo run --example todo_list

use spark_signals::signal;
use spark_view::{Callback, Dictionary, Result, Ui, Value};
use tracing_subscriber::EnvFilter;

const PAGE: &str = r#"
<main id="app"></main>
<l-view name="page">
  <h1>$title</h1>
  <p live="$remaining">$remaining left</p>
  <ul><li repeat="$todos" class="todo">$text <button click="viewmethod.done">done</button></li></ul>
</l-view>
"#;

fn todo(text: &str) -> Value {
    Value::record([("text", text)])
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    println!("=== spark-view Todo List Example ===\n");

    let ui = Ui::from_markup(PAGE)?;

    let todos = Dictionary::new();
    todos.insert("t1", todo("write docs"));
    todos.insert("t2", todo("review patch"));
    todos.insert("t3", todo("ship release"));
    let remaining = signal(Value::from(todos.len()));

    // `done` receives the button node and the todo it was bound to
    let list = todos.clone();
    let left = remaining.clone();
    let done = Callback::named("done", move |args| {
        let Some(text) = args.get(1).map(|ctx| ctx.get("text").to_display()) else {
            return Value::Null;
        };
        let key = list
            .entries()
            .into_iter()
            .find(|(_, v)| v.get("text").to_display() == text)
            .map(|(k, _)| k);
        if let Some(key) = key {
            list.remove(&key);
            left.set(Value::from(list.len()));
        }
        Value::Null
    });
    ui.mediator_handle("viewmethod")?.named(done)?;

    let ctx = Value::record([
        ("title", Value::from("Today")),
        ("todos", Value::Dict(todos.clone())),
        ("remaining", Value::Signal(remaining.clone())),
    ]);
    // Queued until ready
    ui.render(&["page > #app"], ctx)?;
    ui.ready()?;

    println!("Initial render:\n{}\n", ui.inner_markup(ui.root()));

    println!("Adding a todo between t1 and t2...");
    todos.insert_at(1, "t4", todo("answer issues"));
    remaining.set(Value::from(todos.len()));
    println!("{}\n", ui.inner_markup(ui.root()));

    println!("Clicking done on the first todo...");
    let buttons = ui.query_all("li.todo button")?;
    if let Some(&first) = buttons.first() {
        ui.fire(first, "click", &[]);
    }
    println!("{}\n", ui.inner_markup(ui.root()));

    println!("=== Example Complete ===");
    Ok(())
}
