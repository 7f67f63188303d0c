//! Canonical CBOR encoding for deterministic hashing.
//!
//! Content hashes must be reproducible: the same action or block content has
//! to produce identical bytes on every platform and across the JSON wire.
//! Canonical encoding here is CBOR with definite lengths; ordered maps
//! (`BTreeMap`) on the model types keep key order stable.
//!
//! Hashes are domain-separated so an action and a block with coincidentally
//! equal content bytes can never collide.

use serde::Serialize;

use crate::error::CoreError;

/// Domain prefix for action content hashes.
pub const ACTION_DOMAIN: &[u8] = b"murmur-action-v0:";

/// Domain prefix for block content hashes.
pub const BLOCK_DOMAIN: &[u8] = b"murmur-block-v0:";

/// Encode a value to canonical CBOR bytes.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
    Ok(buf)
}

/// Compute a domain-separated Blake3 content hash.
pub fn content_hash(domain: &[u8], bytes: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    hasher.update(bytes);
    *hasher.finalize().as_bytes()
}

/// Generate a random 32-byte identity by hashing fresh random bytes.
///
/// Used for chain and branch identities, which are allocated rather than
/// derived from content.
pub fn random_hash() -> [u8; 32] {
    use rand::RngCore;
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    *blake3::hash(&seed).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_canonical_bytes_deterministic() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2u64);
        map.insert("a".to_string(), 1u64);

        let first = canonical_bytes(&map).unwrap();
        let second = canonical_bytes(&map).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_content_hash_domain_separation() {
        let data = b"same content";
        let a = content_hash(ACTION_DOMAIN, data);
        let b = content_hash(BLOCK_DOMAIN, data);
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_hash_unique() {
        let a = random_hash();
        let b = random_hash();
        assert_ne!(a, b);
    }

    proptest::proptest! {
        #[test]
        fn canonical_bytes_stable_for_strings(s in ".*") {
            let first = canonical_bytes(&s).unwrap();
            let second = canonical_bytes(&s).unwrap();
            proptest::prop_assert_eq!(first, second);
        }
    }
}
