//! Flat-file implementations of the store traits.
//!
//! Each block or chain record is stored as one JSON file named after its
//! hex-encoded hash. Suited to small deployments and debugging, where
//! being able to inspect records with a text editor is worth more than
//! query performance.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use murmur_core::{Block, BlockHash, ChainHash, ChainRecord};
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::traits::{BlockStore, ChainStore};

/// File-backed block store. One JSON file per block under `root`.
pub struct FileBlockStore {
    root: PathBuf,
}

impl FileBlockStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, hash: &BlockHash) -> PathBuf {
        self.root.join(format!("{}.json", hash.to_hex()))
    }
}

#[async_trait]
impl BlockStore for FileBlockStore {
    async fn write_block(&self, block: &Block) -> Result<()> {
        let hash = block.hash.ok_or(StoreError::MissingHash)?;
        let json =
            serde_json::to_vec_pretty(block).map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(&hash), json).await?;
        Ok(())
    }

    async fn read_block(&self, hash: &BlockHash) -> Result<Block> {
        let bytes = match tokio::fs::read(self.path_for(hash)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(hash.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(hash = %hash.to_hex(), error = %e, "corrupt block file");
            StoreError::Serialization(e.to_string())
        })
    }

    async fn delete_block(&self, hash: &BlockHash) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(hash)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// File-backed chain store. One JSON file per chain record under `root`.
pub struct FileChainStore {
    root: PathBuf,
}

impl FileChainStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, hash: &ChainHash) -> PathBuf {
        self.root.join(format!("{}.json", hash.to_hex()))
    }
}

#[async_trait]
impl ChainStore for FileChainStore {
    async fn write_chain(&self, record: &ChainRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(&record.hash), json).await?;
        Ok(())
    }

    async fn read_chain(&self, hash: &ChainHash) -> Result<ChainRecord> {
        let bytes = match tokio::fs::read(self.path_for(hash)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(hash.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(hash = %hash.to_hex(), error = %e, "corrupt chain file");
            StoreError::Serialization(e.to_string())
        })
    }

    async fn delete_chain(&self, hash: &ChainHash) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(hash)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
