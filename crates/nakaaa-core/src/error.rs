//! Error types shared by every gateway integration.
//!
//! Gateways translate their platform failures into [`TransportError`] so the
//! framework can decide between retrying, falling back and giving up without
//! knowing which chat platform it is talking to.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised while talking to the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The platform rejected or dropped an outgoing message.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The bot lacks a platform permission required for the call.
    #[error("missing platform permission: {0}")]
    PermissionDenied(String),

    /// The interaction token expired before a response was sent.
    #[error("interaction '{id}' is no longer valid")]
    StaleInteraction {
        /// Platform identifier of the stale interaction.
        id: String,
    },

    /// An initial response was already sent for this interaction.
    #[error("interaction '{id}' has already been acknowledged")]
    AlreadyReplied {
        /// Platform identifier of the interaction.
        id: String,
    },

    /// The gateway is not connected.
    #[error("gateway '{gateway}' is not connected")]
    NotConnected {
        /// Name of the disconnected gateway.
        gateway: &'static str,
    },

    /// The gateway rejected its credentials.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Creates a send failure.
    pub fn send_failed(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    /// Creates a permission failure.
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Returns `true` when retrying the same call cannot succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::StaleInteraction { .. } | Self::AlreadyReplied { .. } | Self::Unauthorized(_)
        )
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Embed Errors
// =============================================================================

/// Errors raised when an embed violates platform limits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    /// Colour does not fit into 24 bits.
    #[error("embed colour {0:#x} is out of range")]
    InvalidColor(u32),

    /// A text field exceeds its length limit.
    #[error("embed {field} is {len} characters long, the limit is {max}")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Actual length in characters.
        len: usize,
        /// Allowed length in characters.
        max: usize,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
