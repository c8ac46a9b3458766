//! # spark-view
//!
//! Declarative view binding for Rust.
//!
//! Views are markup templates. Binding one against a data context resolves
//! its `$path` placeholders and runs attribute processors that repeat,
//! condition and wire up nodes. Collections built on [`Dictionary`] and
//! [spark-signals](https://github.com/RLabs-Inc/spark-signals) signals keep
//! bound regions in sync as the data changes.
//!
//! ## Architecture
//!
//! ```text
//! define / l-view -> View Registry -> clone -> Bind Engine -> placed in document
//!                                                 |
//!                          Attribute Pipeline ----+---- Mediator Registry
//!                                                 |
//!                                       Node Property Store
//! ```
//!
//! Every node the engine touches gets a property record (context, templator,
//! cached templates, hooks) that lives exactly as long as the node.
//!
//! ## Example
//!
//! ```ignore
//! use spark_view::{Ui, Value};
//!
//! let ui = Ui::from_markup(r#"<div id="main"></div>"#)?;
//! ui.define_view("detail", "<h1>$title</h1>")?;
//! ui.ready()?;
//! ui.render(&["detail > #main"], Value::record([("title", "Hello")]))?;
//! assert_eq!(ui.inner_markup(ui.id("main").unwrap()), "<h1>Hello</h1>");
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Value` data contexts and `Callback`s
//! - [`template`] - templators, including the standard `$path` one
//! - [`collections`] - the observable `Dictionary`
//! - [`dom`] - arena document, markup parser, selectors
//! - [`engine`] - registries, bind frames, the bind algorithm, lifecycle hooks
//! - [`pipeline`] - render strings and the readiness queue
//! - [`primitives`] - built-in processors (`repeat`, `live`, ...) and mediators

pub mod collections;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod template;
pub mod types;

pub use collections::{DictEvent, Dictionary, Subscription};
pub use config::UiConfig;
pub use dom::{Document, NodeId, NodeType, Selector};
pub use engine::{
    AttributeFn, BindFrame, HookHandle, LifecycleEvent, Mediator, MediatorFn, NamedAttribute, Ui,
    WeakUi,
};
pub use error::{Result, UiError};
pub use pipeline::RenderString;
pub use template::Templator;
pub use types::{Callback, Value};
