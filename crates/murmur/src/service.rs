//! The chain service: safe block append under concurrent producers and
//! chain/branch lifecycle against pluggable stores.

use std::sync::Arc;

use bytes::Bytes;
use murmur_core::{Block, BlockHash, Branch, Chain, ChainHash, ChainRecord};
use murmur_store::{BlockStore, ChainStore};
use tracing::debug;

use crate::error::{Result, ServiceError};

/// Configuration for a [`ChainService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How many conflicting append attempts to absorb before giving up
    /// with [`ServiceError::Contention`].
    pub max_append_retries: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_append_retries: 64,
        }
    }
}

/// Orchestrates block creation, branching, and persistence for chains.
///
/// Concurrent producers appending to the same chain are serialized by an
/// optimistic retry loop: build a candidate against the current tail,
/// try to attach it, and start over if another writer advanced the tail
/// first. The result is a single gap-free order without a dedicated
/// sequencer.
pub struct ChainService<B: BlockStore, C: ChainStore> {
    blocks: Arc<B>,
    chains: Arc<C>,
    config: ServiceConfig,
}

impl<B: BlockStore, C: ChainStore> ChainService<B, C> {
    /// Create a service over the given stores.
    pub fn new(blocks: B, chains: C, config: ServiceConfig) -> Self {
        Self {
            blocks: Arc::new(blocks),
            chains: Arc::new(chains),
            config,
        }
    }

    /// The block store backing this service.
    pub fn block_store(&self) -> &B {
        &self.blocks
    }

    /// The chain store backing this service.
    pub fn chain_store(&self) -> &C {
        &self.chains
    }

    /// Create a chain with a fresh random identity and a persisted
    /// genesis block (index 0, no previous hash, empty payload).
    pub async fn new_chain(&self) -> Result<Chain> {
        let chain = Chain::new();
        let mut genesis = chain.new_block(Bytes::new());
        chain.add_block(&mut genesis)?;

        self.blocks.write_block(&genesis).await?;
        self.chains.write_chain(&chain.snapshot()).await?;
        Ok(chain)
    }

    /// Append a block carrying `data` to the chain.
    ///
    /// Loses to a concurrent appender gracefully: a previous-hash
    /// conflict rebuilds the candidate against the fresh tail and tries
    /// again, up to the configured retry bound. Integrity and index
    /// errors abort immediately. On success the block and the updated
    /// chain record are persisted.
    pub async fn new_block(&self, chain: &Chain, data: impl Into<Bytes>) -> Result<Block> {
        let data = data.into();
        let mut attempts = 0;
        loop {
            let mut candidate = chain.new_block(data.clone());
            match chain.add_block(&mut candidate) {
                Ok(_) => {
                    self.blocks.write_block(&candidate).await?;
                    // The snapshot reads the live chain, so it is at
                    // least as new as this append. Concurrent appenders
                    // persist last-writer-wins; a record that trails
                    // the tail is replaced on the next success.
                    self.chains.write_chain(&chain.snapshot()).await?;
                    return Ok(candidate);
                }
                Err(e) if e.is_conflict() => {
                    attempts += 1;
                    debug!(
                        chain = %chain.hash(),
                        attempts,
                        "append lost the race, retrying"
                    );
                    if attempts >= self.config.max_append_retries {
                        return Err(ServiceError::Contention { retries: attempts });
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fork a new chain off an existing block.
    ///
    /// Allocates a brand-new chain (with its own genesis), records the
    /// branch on the parent, and re-persists the parent's record. The
    /// branch copies no blocks; it is provenance only.
    pub async fn new_branch(&self, from_chain: &Chain, from_block: &BlockHash) -> Result<(Branch, Chain)> {
        let to_chain = self.new_chain().await?;
        let branch = from_chain.new_branch(from_block, to_chain.hash())?;
        self.chains.write_chain(&from_chain.snapshot()).await?;
        Ok((branch, to_chain))
    }

    /// Load a chain from the store.
    pub async fn read_chain(&self, hash: &ChainHash) -> Result<Chain> {
        let record = self.chains.read_chain(hash).await?;
        Ok(Chain::from_record(record))
    }

    /// Load a single block from the store.
    pub async fn read_block(&self, hash: &BlockHash) -> Result<Block> {
        Ok(self.blocks.read_block(hash).await?)
    }

    /// Persist a chain's current record.
    pub async fn write_chain(&self, chain: &Chain) -> Result<()> {
        Ok(self.chains.write_chain(&chain.snapshot()).await?)
    }

    /// Remove a chain and every block it references.
    ///
    /// Blocks are not shared across chains, so the transitive delete is
    /// safe. Chains created by recorded branches are left alone; they
    /// are independent.
    pub async fn delete_chain(&self, hash: &ChainHash) -> Result<()> {
        let record: ChainRecord = self.chains.read_chain(hash).await?;
        for block_hash in record.blocks.keys() {
            self.blocks.delete_block(block_hash).await?;
        }
        self.chains.delete_chain(hash).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_store::{MemoryBlockStore, MemoryChainStore, StoreError};

    fn service() -> ChainService<MemoryBlockStore, MemoryChainStore> {
        ChainService::new(
            MemoryBlockStore::new(),
            MemoryChainStore::new(),
            ServiceConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_new_chain_persists_genesis() {
        let svc = service();
        let chain = svc.new_chain().await.unwrap();

        assert_eq!(chain.len(), 1);
        let genesis_hash = chain.last_hash().unwrap();
        let genesis = svc.read_block(&genesis_hash).await.unwrap();
        assert_eq!(genesis.index, 0);
        assert!(genesis.previous_hash.is_none());
        assert!(genesis.data.is_empty());

        let record = svc.chain_store().read_chain(&chain.hash()).await.unwrap();
        assert_eq!(record.last_hash, Some(genesis_hash));
    }

    #[tokio::test]
    async fn test_new_block_appends_and_persists() {
        let svc = service();
        let chain = svc.new_chain().await.unwrap();

        let block = svc.new_block(&chain, &b"first"[..]).await.unwrap();
        assert_eq!(block.index, 1);
        let stored = svc.read_block(&block.hash.unwrap()).await.unwrap();
        assert_eq!(stored, block);

        // The persisted record follows the tail.
        let record = svc.chain_store().read_chain(&chain.hash()).await.unwrap();
        assert_eq!(record.last_hash, block.hash);
    }

    #[tokio::test]
    async fn test_new_branch_records_provenance() {
        let svc = service();
        let chain = svc.new_chain().await.unwrap();
        let block = svc.new_block(&chain, &b"fork here"[..]).await.unwrap();
        let from = block.hash.unwrap();

        let (branch, to_chain) = svc.new_branch(&chain, &from).await.unwrap();
        assert_eq!(branch.from_block, from);
        assert_eq!(branch.to_chain, to_chain.hash());
        // The forked chain starts fresh with exactly its genesis block.
        assert_eq!(to_chain.len(), 1);

        let record = svc.chain_store().read_chain(&chain.hash()).await.unwrap();
        assert_eq!(record.branches.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_chain_removes_blocks() {
        let svc = service();
        let chain = svc.new_chain().await.unwrap();
        let block = svc.new_block(&chain, &b"doomed"[..]).await.unwrap();
        let block_hash = block.hash.unwrap();

        svc.delete_chain(&chain.hash()).await.unwrap();

        assert!(matches!(
            svc.read_block(&block_hash).await,
            Err(ServiceError::Store(StoreError::NotFound(_)))
        ));
        assert!(svc.chain_store().read_chain(&chain.hash()).await.is_err());
    }

    #[tokio::test]
    async fn test_read_chain_restores_tail() {
        let svc = service();
        let chain = svc.new_chain().await.unwrap();
        svc.new_block(&chain, &b"one"[..]).await.unwrap();
        svc.new_block(&chain, &b"two"[..]).await.unwrap();

        let restored = svc.read_chain(&chain.hash()).await.unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.last_hash(), chain.last_hash());

        let appended = svc.new_block(&restored, &b"three"[..]).await.unwrap();
        assert_eq!(appended.index, 3);
    }
}
