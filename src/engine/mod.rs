//! Engine - registries, bind frames and the bind algorithm.
//!
//! - [`PropertyStore`]: per-node engine state, released on discard
//! - [`ViewRegistry`]: named detached templates
//! - [`AttributePipeline`]: attribute processors and their order
//! - [`MediatorRegistry`]: `mediator.property` indirection
//! - [`BindFrame`]: state threaded through a bind pass
//! - lifecycle: added / removed / moved hooks
//! - [`Ui`]: the engine object tying them together

mod attributes;
mod bind;
mod frame;
mod lifecycle;
mod mediators;
mod props;
mod ui;
mod views;

pub use attributes::{AttributeFn, AttributePipeline, NamedAttribute};
pub use frame::{AfterFn, BindFrame};
pub use lifecycle::{HookHandle, LifecycleEvent};
pub(crate) use lifecycle::teardown_live;
pub use mediators::{AttrValue, Mediator, MediatorFn, MediatorRegistry};
pub use props::{Cleanup, HookFn, LiveSource, NodeProperties, PropertyStore, Props, RebindFn};
pub use ui::{Ui, WeakUi};
pub use views::ViewRegistry;
