//! # Murmur Store
//!
//! Persistence seam for murmur blocks and chains.
//!
//! The core is indifferent to where block bodies and chain records live;
//! it talks to the [`BlockStore`] and [`ChainStore`] traits. Backends:
//!
//! - [`MemoryBlockStore`] / [`MemoryChainStore`] - in-memory, for tests and
//!   simulation; lost on drop
//! - [`FileBlockStore`] / [`FileChainStore`] - one JSON file per hash under
//!   a root directory
//! - [`SqliteStore`] - bundled SQLite behind `spawn_blocking`, implementing
//!   both traits

pub mod error;
pub mod file;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::{FileBlockStore, FileChainStore};
pub use memory::{MemoryBlockStore, MemoryChainStore};
pub use sqlite::SqliteStore;
pub use traits::{BlockStore, ChainStore};
