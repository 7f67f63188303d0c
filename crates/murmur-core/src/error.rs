//! Error types for murmur core.

use thiserror::Error;

use crate::block::BlockHash;

/// Core errors that can occur while encoding or hashing primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("action hash mismatch: expected {expected}, got {actual}")]
    ActionHashMismatch { expected: String, actual: String },
}

/// Errors raised by chain mutation.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The chain has no blocks yet.
    #[error("empty chain")]
    EmptyChain,

    /// A block's stored hash does not match its recomputed content hash.
    /// Signals corruption or tampering, never silently repaired.
    #[error("block hash mismatch: expected {expected}, got {got}")]
    HashMismatch { expected: BlockHash, got: BlockHash },

    /// A block's previous hash does not match the chain's tail. This is the
    /// optimistic-concurrency conflict signal: another writer advanced the
    /// tail between candidate construction and append.
    #[error("previous hash mismatch: expected {expected:?}, got {got:?}")]
    PreviousHashMismatch {
        expected: Option<BlockHash>,
        got: Option<BlockHash>,
    },

    /// A block's index is not the successor of the tail index.
    #[error("block index mismatch: expected {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },

    /// The referenced block is not a member of this chain.
    #[error("unknown block: {0}")]
    UnknownBlock(BlockHash),

    /// Canonical encoding of block content failed.
    #[error(transparent)]
    Encoding(#[from] CoreError),
}

impl ChainError {
    /// Check whether this error is the recoverable append conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ChainError::PreviousHashMismatch { .. })
    }
}
