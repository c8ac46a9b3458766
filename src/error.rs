//! Error types for spark-view.
//!
//! Every error is a programmer error raised eagerly at the call that broke the
//! contract. Nothing here is retried or swallowed by the engine.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised by registration, bind and render operations.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("View {0} is not defined")]
    UnknownView(String),

    #[error("Attempting to redefine {0} mediator")]
    DuplicateMediator(String),

    #[error("Mediator {0} is not defined")]
    UnknownMediator(String),

    #[error("Mediator name must be a non-empty string")]
    InvalidMediatorName,

    #[error("Attribute name must be a non-empty string")]
    InvalidAttributeName,

    #[error("Mediator property name on {mediator} must be a string, got: {got}")]
    InvalidPropertyName { mediator: String, got: &'static str },

    #[error("Got null when selecting: {0}")]
    TargetNotFound(String),

    #[error("{0}")]
    MissingHandler(String),

    #[error("Render string must contain >: {0:?}")]
    InvalidRenderString(String),

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Markup error at byte {offset}: {message}")]
    Markup { offset: usize, message: String },

    #[error("Node {0:?} has been discarded")]
    StaleNode(NodeId),

    #[error("Hierarchy request error: {0}")]
    Hierarchy(String),

    #[error("<{tag}> requires a {attribute} attribute")]
    MissingAttribute { tag: String, attribute: String },

    #[error("Attribute '{attribute}' expected {expected}, got {got}")]
    AttributeValue {
        attribute: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("{0}")]
    Handler(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UiError>;
