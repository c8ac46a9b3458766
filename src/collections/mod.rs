//! Observable collections bound by `repeat` and `live`.

mod dictionary;

pub use dictionary::{DictEvent, Dictionary, Listener, Subscription};
