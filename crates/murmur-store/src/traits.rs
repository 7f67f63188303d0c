//! Store traits: the abstract interface for block and chain persistence.
//!
//! These traits keep the chain service storage-agnostic. Implementations
//! include SQLite, JSON files, and in-memory (for tests and simulation).

use std::sync::Arc;

use async_trait::async_trait;
use murmur_core::{Block, BlockHash, ChainHash, ChainRecord};

use crate::error::Result;

/// Persistence for block bodies, keyed by block hash.
///
/// Only appended blocks are persisted, so every stored block carries an
/// assigned hash; writing a hashless candidate is a caller bug surfaced as
/// [`StoreError::MissingHash`](crate::StoreError::MissingHash).
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Insert or overwrite a block.
    async fn write_block(&self, block: &Block) -> Result<()>;

    /// Fetch a block by its hash.
    async fn read_block(&self, hash: &BlockHash) -> Result<Block>;

    /// Remove a block. Removing an absent block is not an error.
    async fn delete_block(&self, hash: &BlockHash) -> Result<()>;
}

/// Persistence for chain records, keyed by chain hash.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// Insert or overwrite a chain record.
    async fn write_chain(&self, record: &ChainRecord) -> Result<()>;

    /// Fetch a chain record by its hash.
    async fn read_chain(&self, hash: &ChainHash) -> Result<ChainRecord>;

    /// Remove a chain record. Removing an absent record is not an error.
    async fn delete_chain(&self, hash: &ChainHash) -> Result<()>;
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for Arc<S> {
    async fn write_block(&self, block: &Block) -> Result<()> {
        (**self).write_block(block).await
    }

    async fn read_block(&self, hash: &BlockHash) -> Result<Block> {
        (**self).read_block(hash).await
    }

    async fn delete_block(&self, hash: &BlockHash) -> Result<()> {
        (**self).delete_block(hash).await
    }
}

#[async_trait]
impl<S: ChainStore + ?Sized> ChainStore for Arc<S> {
    async fn write_chain(&self, record: &ChainRecord) -> Result<()> {
        (**self).write_chain(record).await
    }

    async fn read_chain(&self, hash: &ChainHash) -> Result<ChainRecord> {
        (**self).read_chain(hash).await
    }

    async fn delete_chain(&self, hash: &ChainHash) -> Result<()> {
        (**self).delete_chain(hash).await
    }
}
