//! Host tree - the document the engine binds against.
//!
//! - [`Document`]: arena of nodes addressed by generational [`NodeId`]s
//! - [`markup`]: HTML-ish parser and serializer
//! - [`Selector`]: CSS-like selectors for render targets
//!
//! The engine never owns nodes itself; it annotates them through the
//! property store keyed by [`NodeId`].

mod node;
pub mod markup;
mod selector;

pub use node::*;
pub use selector::Selector;
