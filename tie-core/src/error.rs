//! Error types for tie-core.

use thiserror::Error;

use crate::host::ElementId;

/// Result type alias using tie-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding, refreshing or propagating values.
#[derive(Error, Debug)]
pub enum Error {
    /// A binding declaration did not match `kind: path`
    #[error("Malformed binding rule {rule:?} on element {element}")]
    MalformedRule { element: ElementId, rule: String },

    /// An intermediate path segment is not an object
    #[error("Invalid path '{path}': segment '{segment}' does not resolve to an object")]
    UnresolvablePath { path: String, segment: String },

    /// A binding kind outside text/html/value/click reached the updater
    #[error("Tried to set '{path}' to unsupported '{kind}' of an element")]
    UnsupportedKind { path: String, kind: String },

    /// The data object is already observed by another engine
    #[error("Data object is already bound to another engine")]
    AlreadyBound,

    /// A click binding points at something that cannot be invoked
    #[error("Value at '{path}' is not an action")]
    NotAnAction { path: String },

    /// An event arrived for an element without a stamped path
    #[error("No '{event_type}' binding stamped on element {element}")]
    UnboundEvent { event_type: String, element: ElementId },

    /// Re-entrant propagation went deeper than allowed
    #[error("Maximum update depth {max_depth} exceeded while updating '{path}'")]
    UpdateDepthExceeded { path: String, max_depth: usize },

    /// The engine was dropped while something still referenced it
    #[error("Binding engine is no longer alive")]
    Detached,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while loading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed rule error.
    pub fn malformed_rule(element: ElementId, rule: impl Into<String>) -> Self {
        Self::MalformedRule {
            element,
            rule: rule.into(),
        }
    }

    /// Create an unresolvable path error.
    pub fn unresolvable_path(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::UnresolvablePath {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Create an unsupported binding kind error.
    pub fn unsupported_kind(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// Create an update depth exceeded error.
    pub fn update_depth_exceeded(path: impl Into<String>, max_depth: usize) -> Self {
        Self::UpdateDepthExceeded {
            path: path.into(),
            max_depth,
        }
    }
}
