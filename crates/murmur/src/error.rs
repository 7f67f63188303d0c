//! Error types for the chain service.

use murmur_core::ChainError;
use murmur_store::StoreError;
use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by [`crate::ChainService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A chain-level integrity or structural failure.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The persistence backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An append lost the optimistic race too many times in a row.
    #[error("append abandoned after {retries} conflicting attempts")]
    Contention { retries: usize },
}
