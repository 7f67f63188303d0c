//! Graph construction for simulated gossip networks.
//!
//! Both builders take `(total_nodes, connections_per_node)` and wire
//! nodes with `tokio::io::duplex` pairs: the near end becomes an
//! outbound connection on the source node, the far end is staged on the
//! target node's pipe listener.

use murmur_net::{Node, NodeConfig, PipeConnector, PipeListener};

use crate::error::{Result, SimError};

/// Buffer size for each in-memory duplex link.
const PIPE_CAPACITY: usize = 64 * 1024;

fn make_nodes(total: usize) -> (Vec<Node>, Vec<PipeListener>) {
    let nodes = (0..total)
        .map(|i| {
            Node::new(NodeConfig {
                id: i as u64,
                ..NodeConfig::default()
            })
        })
        .collect();
    let listeners = (0..total).map(|_| PipeListener::new()).collect();
    (nodes, listeners)
}

fn attach_listeners(nodes: &[Node], listeners: Vec<PipeListener>) {
    for (node, listener) in nodes.iter().zip(listeners) {
        node.add_listener(listener);
    }
}

/// Builds a directed ring: node *i* connects forward to the next
/// `connections_per_node` nodes, wrapping at the end and skipping
/// itself, so every node has the same out-degree and a flood started
/// anywhere loops around to reach all nodes.
pub struct LoopBuilder {
    pub total_nodes: usize,
    pub connections_per_node: usize,
}

impl LoopBuilder {
    /// Create a builder for `total_nodes` nodes with
    /// `connections_per_node` outbound links each.
    pub fn new(total_nodes: usize, connections_per_node: usize) -> Self {
        Self {
            total_nodes,
            connections_per_node,
        }
    }

    /// Construct and wire the nodes.
    ///
    /// Fails with [`SimError::InvalidTopology`] unless
    /// `connections_per_node < total_nodes`.
    pub fn build(&self) -> Result<Vec<Node>> {
        if self.connections_per_node >= self.total_nodes {
            return Err(SimError::InvalidTopology {
                total_nodes: self.total_nodes,
                connections_per_node: self.connections_per_node,
            });
        }

        let (nodes, listeners) = make_nodes(self.total_nodes);

        for i in 0..self.total_nodes {
            for j in 0..self.connections_per_node {
                let mut next = i + j + 1;
                if next >= self.total_nodes {
                    let mut diff = next - self.total_nodes;
                    if diff == i {
                        diff += 1;
                    }
                    next = diff;
                }

                let (near, far) = tokio::io::duplex(PIPE_CAPACITY);
                nodes[i].add_connection(PipeConnector::new(near));
                listeners[next].push(far);
            }
        }

        attach_listeners(&nodes, listeners);
        Ok(nodes)
    }
}

/// Builds a K-ary fan-out tree: node *i*'s children sit at linear
/// indices `i*K + 1 ..= i*K + K`. Each parent/child edge is realized as
/// two independent duplex links, one per direction, so a leaf can gossip
/// back up toward the root.
pub struct WebBuilder {
    pub total_nodes: usize,
    pub connections_per_node: usize,
}

impl WebBuilder {
    /// Create a builder for a tree of `total_nodes` nodes with fan-out
    /// `connections_per_node`.
    pub fn new(total_nodes: usize, connections_per_node: usize) -> Self {
        Self {
            total_nodes,
            connections_per_node,
        }
    }

    /// Construct and wire the nodes.
    pub fn build(&self) -> Result<Vec<Node>> {
        if self.total_nodes == 0 || self.connections_per_node == 0 {
            return Err(SimError::InvalidTopology {
                total_nodes: self.total_nodes,
                connections_per_node: self.connections_per_node,
            });
        }

        let (nodes, listeners) = make_nodes(self.total_nodes);

        for i in 0..self.total_nodes {
            for j in 0..self.connections_per_node {
                let k = i * self.connections_per_node + j + 1;
                if k >= self.total_nodes {
                    break;
                }

                // Downward link: parent i writes, child k accepts.
                let (down_near, down_far) = tokio::io::duplex(PIPE_CAPACITY);
                nodes[i].add_connection(PipeConnector::new(down_near));
                listeners[k].push(down_far);

                // Upward link: child k writes, parent i accepts.
                let (up_near, up_far) = tokio::io::duplex(PIPE_CAPACITY);
                nodes[k].add_connection(PipeConnector::new(up_near));
                listeners[i].push(up_far);
            }
        }

        attach_listeners(&nodes, listeners);
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loop_builder_uniform_out_degree() {
        let nodes = LoopBuilder::new(8, 3).build().unwrap();
        assert_eq!(nodes.len(), 8);
        for node in &nodes {
            assert_eq!(node.connection_count(), 3);
        }
        for node in &nodes {
            node.shutdown();
        }
    }

    #[tokio::test]
    async fn test_loop_builder_rejects_too_many_connections() {
        assert!(matches!(
            LoopBuilder::new(4, 4).build(),
            Err(SimError::InvalidTopology { .. })
        ));
        assert!(matches!(
            LoopBuilder::new(4, 9).build(),
            Err(SimError::InvalidTopology { .. })
        ));
    }

    #[tokio::test]
    async fn test_web_builder_out_degrees() {
        // 3-ary tree over 8 nodes: node 0 has children 1,2,3; node 1 has
        // 4,5,6; node 2 has 7. Each child link adds one upward return
        // connection on the child.
        let nodes = WebBuilder::new(8, 3).build().unwrap();
        assert_eq!(nodes[0].connection_count(), 3);
        assert_eq!(nodes[1].connection_count(), 4);
        assert_eq!(nodes[2].connection_count(), 2);
        assert_eq!(nodes[5].connection_count(), 1);
        assert_eq!(nodes[7].connection_count(), 1);
        for node in &nodes {
            node.shutdown();
        }
    }

    #[tokio::test]
    async fn test_web_builder_rejects_degenerate_shapes() {
        assert!(WebBuilder::new(0, 3).build().is_err());
        assert!(WebBuilder::new(8, 0).build().is_err());
    }
}
