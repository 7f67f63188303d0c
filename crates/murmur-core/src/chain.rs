//! Chain: an append-only, hash-linked ordered sequence of blocks.
//!
//! A chain tracks only `{block hash → index}` plus the tail hash; block
//! bodies live in a separate store. Mutation is serialized by a lock scoped
//! to the chain, held only for the critical read-modify-write and never
//! across I/O.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use bytes::Bytes;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::block::{Block, BlockHash};
use crate::branch::{Branch, BranchHash};
use crate::canonical::random_hash;
use crate::error::ChainError;

/// A 32-byte chain identifier, allocated randomly at chain creation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainHash(pub [u8; 32]);

impl ChainHash {
    /// Create a new ChainHash from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Generate a fresh random chain identity.
    pub fn random() -> Self {
        Self(random_hash())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for ChainHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ChainHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ChainHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Mutable chain state, guarded by the chain's lock.
#[derive(Default)]
struct ChainInner {
    /// Membership and ordering index: block hash → block index.
    blocks: HashMap<BlockHash, u64>,

    /// Current tail (hash and index), `None` while the chain is empty.
    tail: Option<(BlockHash, u64)>,

    /// Recorded fork points. Branches are never removed automatically.
    branches: HashMap<BranchHash, Branch>,
}

/// An append-only block sequence with integrity and ordering invariants.
///
/// A chain is exclusively owned by whichever service mutates it; concurrent
/// mutation is serialized internally. Share it via `Arc` between writers.
pub struct Chain {
    hash: ChainHash,
    inner: Mutex<ChainInner>,
}

impl Chain {
    /// Create a new empty chain with a random identity.
    pub fn new() -> Self {
        Self::with_hash(ChainHash::random())
    }

    /// Create a new empty chain with the given identity.
    pub fn with_hash(hash: ChainHash) -> Self {
        Self {
            hash,
            inner: Mutex::new(ChainInner::default()),
        }
    }

    /// Rebuild a chain from its persisted record.
    pub fn from_record(record: ChainRecord) -> Self {
        let tail = record
            .last_hash
            .and_then(|last| record.blocks.get(&last).map(|&index| (last, index)));
        Self {
            hash: record.hash,
            inner: Mutex::new(ChainInner {
                blocks: record.blocks,
                tail,
                branches: record.branches,
            }),
        }
    }

    /// The chain's identity.
    pub fn hash(&self) -> ChainHash {
        self.hash
    }

    /// Build an unattached candidate block extending the current tail.
    ///
    /// The tail read and candidate construction are atomic with respect to
    /// other `new_block`/`add_block` calls, but the tail may advance before
    /// the caller appends the candidate; the append then fails with
    /// [`ChainError::PreviousHashMismatch`] and the caller retries.
    pub fn new_block(&self, data: impl Into<Bytes>) -> Block {
        let inner = self.inner.lock().unwrap();
        let (index, previous_hash) = match inner.tail {
            Some((last, last_index)) => (last_index + 1, Some(last)),
            None => (0, None),
        };
        Block {
            data: data.into(),
            index,
            previous_hash,
            timestamp: now_millis(),
            hash: None,
        }
    }

    /// Append a block to the chain.
    ///
    /// The content hash is recomputed; if the block carries a hash it must
    /// match, otherwise the recomputed value is assigned. The block must
    /// link to the current tail and carry the successor index. On success
    /// the block's hash is recorded and the tail advances.
    pub fn add_block(&self, block: &mut Block) -> Result<BlockHash, ChainError> {
        let mut inner = self.inner.lock().unwrap();

        let computed = block.compute_hash()?;
        match block.hash {
            Some(stored) if stored != computed => {
                return Err(ChainError::HashMismatch {
                    expected: computed,
                    got: stored,
                });
            }
            Some(_) => {}
            None => block.hash = Some(computed),
        }

        let (expected_prev, expected_index) = match inner.tail {
            Some((last, last_index)) => (Some(last), last_index + 1),
            None => (None, 0),
        };
        if block.previous_hash != expected_prev {
            return Err(ChainError::PreviousHashMismatch {
                expected: expected_prev,
                got: block.previous_hash,
            });
        }
        if block.index != expected_index {
            return Err(ChainError::IndexMismatch {
                expected: expected_index,
                got: block.index,
            });
        }

        inner.blocks.insert(computed, block.index);
        inner.tail = Some((computed, block.index));
        Ok(computed)
    }

    /// Record a branch from a member block of this chain to another chain.
    pub fn new_branch(&self, from: &BlockHash, to_chain: ChainHash) -> Result<Branch, ChainError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.blocks.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        if !inner.blocks.contains_key(from) {
            return Err(ChainError::UnknownBlock(*from));
        }

        let branch = Branch {
            from_block: *from,
            hash: BranchHash::random(),
            to_chain,
        };
        inner.branches.insert(branch.hash, branch);
        Ok(branch)
    }

    /// Hash of the current tail block, if any.
    pub fn last_hash(&self) -> Option<BlockHash> {
        self.inner.lock().unwrap().tail.map(|(hash, _)| hash)
    }

    /// Number of blocks appended so far.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().blocks.len()
    }

    /// Whether the chain has no blocks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a block hash is a member of this chain.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.inner.lock().unwrap().blocks.contains_key(hash)
    }

    /// The index recorded for a member block, if any.
    pub fn index_of(&self, hash: &BlockHash) -> Option<u64> {
        self.inner.lock().unwrap().blocks.get(hash).copied()
    }

    /// All member block hashes, in no particular order.
    pub fn block_hashes(&self) -> Vec<BlockHash> {
        self.inner.lock().unwrap().blocks.keys().copied().collect()
    }

    /// A branch by its identity.
    pub fn branch(&self, hash: &BranchHash) -> Option<Branch> {
        self.inner.lock().unwrap().branches.get(hash).copied()
    }

    /// All recorded branches.
    pub fn branches(&self) -> Vec<Branch> {
        self.inner.lock().unwrap().branches.values().copied().collect()
    }

    /// Take a serializable snapshot of the chain for persistence.
    pub fn snapshot(&self) -> ChainRecord {
        let inner = self.inner.lock().unwrap();
        ChainRecord {
            hash: self.hash,
            blocks: inner.blocks.clone(),
            last_hash: inner.tail.map(|(hash, _)| hash),
            branches: inner.branches.clone(),
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("hash", &self.hash)
            .field("len", &self.len())
            .finish()
    }
}

/// The serializable flat form of a chain, as persisted by chain stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    /// The chain's identity.
    pub hash: ChainHash,

    /// Block membership: hash → index.
    pub blocks: HashMap<BlockHash, u64>,

    /// Hash of the tail block, `None` while empty.
    pub last_hash: Option<BlockHash>,

    /// Recorded fork points.
    pub branches: HashMap<BranchHash, Branch>,
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
