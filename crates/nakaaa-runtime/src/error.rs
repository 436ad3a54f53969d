//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use nakaaa_core::TransportError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is incomplete.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The gateway refused to connect.
    #[error("Gateway '{gateway}' failed: {source}")]
    Gateway {
        gateway: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Runtime is already running")]
    AlreadyStarted,

    #[error("Runtime is not running")]
    NotStarted,
}

impl RuntimeError {
    pub fn gateway(gateway: &'static str, source: TransportError) -> Self {
        Self::Gateway { gateway, source }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
