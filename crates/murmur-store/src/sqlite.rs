//! SQLite implementations of the store traits.
//!
//! This is the primary durable backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use murmur_core::{Block, BlockHash, ChainHash, ChainRecord};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{BlockStore, ChainStore};

/// SQLite-based store implementing both [`BlockStore`] and [`ChainStore`].
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn lock_conn(conn: &Arc<Mutex<Connection>>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

fn row_to_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<Block> {
    let hash_hex: String = row.get("block_hash")?;
    let previous_hex: Option<String> = row.get("previous_hash")?;
    let data: Vec<u8> = row.get("data")?;

    let hash = BlockHash::from_hex(&hash_hex).map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "block_hash".into(), rusqlite::types::Type::Text)
    })?;
    let previous_hash = previous_hex
        .map(|h| {
            BlockHash::from_hex(&h).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    2,
                    "previous_hash".into(),
                    rusqlite::types::Type::Text,
                )
            })
        })
        .transpose()?;

    Ok(Block {
        data: Bytes::from(data),
        index: row.get::<_, i64>("idx")? as u64,
        previous_hash,
        timestamp: row.get("timestamp")?,
        hash: Some(hash),
    })
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn write_block(&self, block: &Block) -> Result<()> {
        let hash = block.hash.ok_or(StoreError::MissingHash)?;
        let block = block.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                "INSERT OR REPLACE INTO blocks
                    (block_hash, idx, previous_hash, timestamp, data, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    hash.to_hex(),
                    block.index as i64,
                    block.previous_hash.map(|h| h.to_hex()),
                    block.timestamp,
                    block.data.as_ref(),
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn read_block(&self, hash: &BlockHash) -> Result<Block> {
        let hash = *hash;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.query_row(
                "SELECT block_hash, idx, previous_hash, timestamp, data
                 FROM blocks WHERE block_hash = ?1",
                params![hash.to_hex()],
                row_to_block,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(hash.to_hex()))
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn delete_block(&self, hash: &BlockHash) -> Result<()> {
        let hash = *hash;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                "DELETE FROM blocks WHERE block_hash = ?1",
                params![hash.to_hex()],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl ChainStore for SqliteStore {
    async fn write_chain(&self, record: &ChainRecord) -> Result<()> {
        let hash = record.hash;
        let json =
            serde_json::to_string(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                "INSERT OR REPLACE INTO chains (chain_hash, record, updated_at)
                 VALUES (?1, ?2, ?3)",
                params![hash.to_hex(), json, now_millis()],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn read_chain(&self, hash: &ChainHash) -> Result<ChainRecord> {
        let hash = *hash;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            let json: Option<String> = conn
                .query_row(
                    "SELECT record FROM chains WHERE chain_hash = ?1",
                    params![hash.to_hex()],
                    |row| row.get(0),
                )
                .optional()?;

            let json = json.ok_or_else(|| StoreError::NotFound(hash.to_hex()))?;
            serde_json::from_str(&json).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn delete_chain(&self, hash: &ChainHash) -> Result<()> {
        let hash = *hash;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                "DELETE FROM chains WHERE chain_hash = ?1",
                params![hash.to_hex()],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::Chain;

    fn sealed_block(chain: &Chain, data: &'static [u8]) -> (Block, BlockHash) {
        let mut block = chain.new_block(data);
        let hash = chain.add_block(&mut block).unwrap();
        (block, hash)
    }

    #[tokio::test]
    async fn test_write_and_read_block() {
        let store = SqliteStore::open_memory().unwrap();
        let chain = Chain::new();
        let (genesis, genesis_hash) = sealed_block(&chain, b"");
        let (block, hash) = sealed_block(&chain, b"payload");

        store.write_block(&genesis).await.unwrap();
        store.write_block(&block).await.unwrap();

        let read = store.read_block(&hash).await.unwrap();
        assert_eq!(read, block);
        assert_eq!(read.previous_hash, Some(genesis_hash));
    }

    #[tokio::test]
    async fn test_read_missing_block() {
        let store = SqliteStore::open_memory().unwrap();
        let result = store.read_block(&BlockHash::ZERO).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_block_requires_hash() {
        let store = SqliteStore::open_memory().unwrap();
        let candidate = Chain::new().new_block(&b"data"[..]);
        assert!(matches!(
            store.write_block(&candidate).await,
            Err(StoreError::MissingHash)
        ));
    }

    #[tokio::test]
    async fn test_delete_block_is_idempotent() {
        let store = SqliteStore::open_memory().unwrap();
        let chain = Chain::new();
        let (block, hash) = sealed_block(&chain, b"");

        store.write_block(&block).await.unwrap();
        store.delete_block(&hash).await.unwrap();
        store.delete_block(&hash).await.unwrap();
        assert!(store.read_block(&hash).await.is_err());
    }

    #[tokio::test]
    async fn test_chain_record_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let chain = Chain::new();
        sealed_block(&chain, b"");
        sealed_block(&chain, b"one");
        sealed_block(&chain, b"two");

        let record = chain.snapshot();
        store.write_chain(&record).await.unwrap();

        let read = store.read_chain(&chain.hash()).await.unwrap();
        assert_eq!(read, record);

        // A restored chain keeps appending from the same tail.
        let restored = Chain::from_record(read);
        let mut next = restored.new_block(&b"three"[..]);
        restored.add_block(&mut next).unwrap();
        assert_eq!(next.index, 3);

        store.delete_chain(&chain.hash()).await.unwrap();
        assert!(store.read_chain(&chain.hash()).await.is_err());
    }
}
