//! Primitives - the built-in attribute processors and mediators.
//!
//! - repeat - one bound clone per collection entry, kept in sync with a
//!   [`Dictionary`](crate::collections::Dictionary)
//! - live - rebind a node when its dictionary or signal changes
//! - helpers - `templator`, `with`, `if`/`ifnot`, event listeners, `display`,
//!   `hash`
//! - mediators - `templator`, `view`, `viewmethod`
//!
//! Everything here is installed by [`install_defaults`] when
//! [`UiConfig::install_defaults`](crate::config::UiConfig) is set.

mod helpers;
mod live;
mod mediators;
mod repeat;

use tracing::{debug, error};

use crate::engine::{NamedAttribute, Ui};

/// Register the default processors (in processing order) and mediators.
///
/// Registration only fails on malformed names, which the defaults never
/// use; a failure is logged rather than aborting engine construction.
pub fn install_defaults(ui: &Ui) {
    let [click, blur, submit, change] = helpers::EVENT_ATTRIBUTES;
    let processors = [
        NamedAttribute::new("templator", helpers::templator),
        NamedAttribute::new("with", helpers::with),
        NamedAttribute::new("if", helpers::if_),
        NamedAttribute::new("ifnot", helpers::ifnot),
        NamedAttribute::new("repeat", repeat::repeat),
        NamedAttribute::new("live", live::live),
        NamedAttribute::new(click, helpers::listener(click)),
        NamedAttribute::new("display", helpers::display),
        NamedAttribute::new(blur, helpers::listener(blur)),
        NamedAttribute::new(submit, helpers::listener(submit)),
        NamedAttribute::new(change, helpers::listener(change)),
        NamedAttribute::new("hash", helpers::hash),
    ];
    if let Err(err) = ui.attributes(processors) {
        error!(error = %err, "default attribute registration failed");
    }

    let defined = ui
        .mediator("templator", mediators::templator)
        .and_then(|_| ui.mediator("view", mediators::view))
        .and_then(|_| ui.mediator("viewmethod", mediators::viewmethod));
    if let Err(err) = defined {
        error!(error = %err, "default mediator registration failed");
    }
    debug!("default processors installed");
}
