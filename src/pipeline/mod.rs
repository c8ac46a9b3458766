//! Pipeline - getting bound views into the document.
//!
//! - [`render`]: render strings, chained placement, the render entry points
//! - [`ready`]: readiness signal, pending-work queue, view loading

pub mod ready;
pub mod render;

pub use ready::Readiness;
pub use render::{split_args, RenderString};
