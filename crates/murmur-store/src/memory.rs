//! In-memory implementations of the store traits.
//!
//! Primarily for tests and simulation. Same semantics as the durable
//! backends, but everything lives in memory and is lost on drop.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use murmur_core::{Block, BlockHash, ChainHash, ChainRecord};

use crate::error::{Result, StoreError};
use crate::traits::{BlockStore, ChainStore};

/// In-memory block store. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<BlockHash, Block>>,
}

impl MemoryBlockStore {
    /// Create a new empty in-memory block store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn write_block(&self, block: &Block) -> Result<()> {
        let hash = block.hash.ok_or(StoreError::MissingHash)?;
        self.blocks.write().unwrap().insert(hash, block.clone());
        Ok(())
    }

    async fn read_block(&self, hash: &BlockHash) -> Result<Block> {
        self.blocks
            .read()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.to_hex()))
    }

    async fn delete_block(&self, hash: &BlockHash) -> Result<()> {
        self.blocks.write().unwrap().remove(hash);
        Ok(())
    }
}

/// In-memory chain store. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryChainStore {
    chains: RwLock<HashMap<ChainHash, ChainRecord>>,
}

impl MemoryChainStore {
    /// Create a new empty in-memory chain store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChainStore for MemoryChainStore {
    async fn write_chain(&self, record: &ChainRecord) -> Result<()> {
        self.chains
            .write()
            .unwrap()
            .insert(record.hash, record.clone());
        Ok(())
    }

    async fn read_chain(&self, hash: &ChainHash) -> Result<ChainRecord> {
        self.chains
            .read()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.to_hex()))
    }

    async fn delete_chain(&self, hash: &ChainHash) -> Result<()> {
        self.chains.write().unwrap().remove(hash);
        Ok(())
    }
}
