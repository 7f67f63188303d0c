//! Unified murmur API.
//!
//! murmur is an experimental peer-to-peer substrate: gossip nodes flood
//! uniquely hashed actions through point-to-point links, and hash-linked
//! chains give a node a durable, tamper-evident order over the actions
//! it has processed. Deterministic topology builders wire many nodes
//! together for simulation without real sockets.
//!
//! This crate re-exports the pieces and adds [`ChainService`], which
//! makes block append safe under concurrent producers and manages
//! chain, branch, and store lifecycle.

pub mod error;
pub mod service;

pub use error::{Result, ServiceError};
pub use service::{ChainService, ServiceConfig};

pub use murmur_core::{
    Action, ActionHash, Block, BlockHash, Branch, BranchHash, Chain, ChainError, ChainHash,
    ChainRecord, CoreError, Parameters,
};
pub use murmur_net::{
    Connector, Listener, NetError, Node, NodeConfig, PipeConnector, PipeListener, TcpConnector,
    TcpListener,
};
pub use murmur_sim::{LoopBuilder, Network, SimError, WebBuilder};
pub use murmur_store::{
    BlockStore, ChainStore, FileBlockStore, FileChainStore, MemoryBlockStore, MemoryChainStore,
    SqliteStore, StoreError,
};
