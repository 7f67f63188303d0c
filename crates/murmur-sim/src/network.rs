//! Indexed wrapper around a built set of nodes.

use murmur_core::Action;
use murmur_net::Node;

use crate::error::{Result, SimError};

/// A fully wired simulation network.
pub struct Network {
    nodes: Vec<Node>,
}

impl Network {
    /// Wrap a set of built nodes.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Number of nodes in the network.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the network has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node at the given index.
    pub fn node(&self, index: usize) -> Result<&Node> {
        self.nodes.get(index).ok_or(SimError::InvalidNodeIndex(index))
    }

    /// All nodes, in construction order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Inject an action at the root node (index 0).
    pub fn push(&self, action: &Action) -> Result<()> {
        self.node(0)?.write(action)?;
        Ok(())
    }

    /// Shut down every node's background tasks.
    pub fn shutdown(&self) {
        for node in &self.nodes {
            node.shutdown();
        }
    }
}
