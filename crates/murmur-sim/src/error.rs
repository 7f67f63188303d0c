//! Error types for topology construction and the simulation network.

use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced by builders and the network wrapper.
#[derive(Debug, Error)]
pub enum SimError {
    /// The node/connection counts cannot produce a valid graph.
    #[error("invalid topology: {total_nodes} nodes with {connections_per_node} connections each")]
    InvalidTopology {
        total_nodes: usize,
        connections_per_node: usize,
    },

    /// No node exists at the requested index.
    #[error("invalid node index: {0}")]
    InvalidNodeIndex(usize),

    /// A gossip operation on a member node failed.
    #[error(transparent)]
    Net(#[from] murmur_net::NetError),
}
