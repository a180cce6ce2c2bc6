//! Network error types for framing and transport operations.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying socket failure
    #[error("transport i/o: {0}")]
    Io(#[from] io::Error),

    /// Failed to encode or decode a message payload
    #[error("invalid message format: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    /// Message size exceeded maximum allowed
    #[error("message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },

    /// Every peer is gone and no reply can ever arrive
    #[error("transport closed")]
    Closed,

    /// A registration reply has nowhere to go
    #[error("no pending registration")]
    NoPendingRegistration,
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
