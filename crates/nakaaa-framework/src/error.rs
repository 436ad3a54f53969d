//! Error types for the nakaaa framework layer.

use thiserror::Error;

/// Error type returned by handlers, event listeners and commands.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors raised while running a handler or loading a definition.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No handler or definition is registered under this identifier.
    #[error("no {kind} named '{name}' is registered")]
    NotFound {
        /// What was looked up ("handler", "event", ...).
        kind: &'static str,
        /// The identifier that failed to resolve.
        name: String,
    },

    /// A definition resolved without a name.
    #[error("definition '{origin}' does not declare a name")]
    MissingName {
        /// Where the definition came from.
        origin: String,
    },

    /// A definition could not be resolved.
    #[error("failed to resolve '{origin}': {reason}")]
    Resolve {
        /// Where the definition came from.
        origin: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A handler ran and reported an error.
    #[error("'{name}' failed: {source}")]
    Failed {
        /// Handler identifier.
        name: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },
}

impl LoadError {
    /// Creates a resolution failure.
    pub fn resolve(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolve {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing-name failure.
    pub fn missing_name(origin: impl Into<String>) -> Self {
        Self::MissingName {
            origin: origin.into(),
        }
    }
}

// =============================================================================
// Introspection Errors
// =============================================================================

/// Errors raised by read-only registry queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectError {
    /// The named command does not exist in the queried table.
    #[error("Command {0} not found!")]
    CommandNotFound(String),
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;
