//! Block: one immutable, indexed, hash-identified entry in a chain.

use bytes::Bytes;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::canonical::{canonical_bytes, content_hash, BLOCK_DOMAIN};
use crate::error::CoreError;

/// A 32-byte block identifier, computed from the block's canonical content
/// (index, timestamp, data, previous hash).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    /// Create a new BlockHash from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
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

    /// The zero block hash (sentinel).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for BlockHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// An ordered payload record within a chain.
///
/// A block returned by [`Chain::new_block`](crate::chain::Chain::new_block)
/// is an unattached candidate with `hash: None`; the hash is assigned (or
/// checked, if already set) when the block is appended. Once appended, a
/// block is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Opaque payload bytes.
    pub data: Bytes,

    /// Position within the chain, starting at 0 for genesis.
    pub index: u64,

    /// Hash of the preceding block (`None` for genesis).
    pub previous_hash: Option<BlockHash>,

    /// Creation time (Unix milliseconds).
    pub timestamp: i64,

    /// Content hash; `None` until the block is appended to a chain.
    pub hash: Option<BlockHash>,
}

impl Block {
    /// Compute the content hash of this block.
    ///
    /// The stored `hash` field does not participate in its own computation.
    pub fn compute_hash(&self) -> Result<BlockHash, CoreError> {
        let bytes = canonical_bytes(&(
            self.index,
            self.timestamp,
            self.data.as_ref(),
            &self.previous_hash,
        ))?;
        Ok(BlockHash(content_hash(BLOCK_DOMAIN, &bytes)))
    }

    /// Check whether this is a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: u64, previous_hash: Option<BlockHash>) -> Block {
        Block {
            data: Bytes::from_static(b"payload"),
            index,
            previous_hash,
            timestamp: 1_700_000_000_000,
            hash: None,
        }
    }

    #[test]
    fn test_block_hash_deterministic() {
        let block = candidate(0, None);
        assert_eq!(block.compute_hash().unwrap(), block.compute_hash().unwrap());
    }

    #[test]
    fn test_block_hash_covers_linkage() {
        let genesis = candidate(0, None);
        let linked = candidate(0, Some(BlockHash::from_bytes([1; 32])));
        assert_ne!(
            genesis.compute_hash().unwrap(),
            linked.compute_hash().unwrap()
        );
    }

    #[test]
    fn test_block_hash_ignores_assigned_hash() {
        let mut block = candidate(3, Some(BlockHash::from_bytes([2; 32])));
        let before = block.compute_hash().unwrap();
        block.hash = Some(BlockHash::from_bytes([0xee; 32]));
        assert_eq!(before, block.compute_hash().unwrap());
    }

    #[test]
    fn test_genesis_detection() {
        assert!(candidate(0, None).is_genesis());
        assert!(!candidate(1, Some(BlockHash::ZERO)).is_genesis());
    }
}
