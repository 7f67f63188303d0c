//! Error types for the gossip layer.

use murmur_core::ActionHash;
use thiserror::Error;

/// Result type for gossip operations.
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors surfaced by nodes and the wire codec.
#[derive(Debug, Error)]
pub enum NetError {
    /// The action's hash has already been seen by this node.
    ///
    /// A benign no-op signal, not a failure of the system.
    #[error("duplicate action: {0}")]
    DuplicateAction(ActionHash),

    /// Serializing an outgoing action failed.
    #[error("frame encoding failed: {0}")]
    Encoding(String),

    /// An inbound frame could not be decoded.
    #[error("frame decoding failed: {0}")]
    Decoding(String),

    /// The node's local delivery queue has shut down.
    #[error("local delivery channel closed")]
    Closed,

    /// Transport-level I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
