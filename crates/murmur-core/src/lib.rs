//! # Murmur Core
//!
//! Pure primitives for the murmur substrate: actions, blocks, chains, and
//! canonical hashing.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Action`] - An immutable, uniquely-hashed command invocation
//! - [`ActionHash`] - Content-addressed identifier (Blake3 hash)
//! - [`Block`] - One immutable, indexed entry in a chain
//! - [`Chain`] - An append-only, hash-linked sequence of blocks
//! - [`Branch`] - A recorded fork point between two chains
//!
//! ## Canonicalization
//!
//! All content hashes are computed over deterministic CBOR. See the
//! [`canonical`] module.

pub mod action;
pub mod block;
pub mod branch;
pub mod canonical;
pub mod chain;
pub mod error;
pub mod types;

pub use action::{Action, Parameters};
pub use block::{Block, BlockHash};
pub use branch::{Branch, BranchHash};
pub use canonical::canonical_bytes;
pub use chain::{Chain, ChainHash, ChainRecord};
pub use error::{ChainError, CoreError};
pub use types::ActionHash;
