//! Gossip propagation layer for murmur.
//!
//! A [`Node`] owns a set of outbound connections and inbound listeners.
//! Writing an action to any node floods it through the graph: each node
//! that sees the action for the first time delivers it locally and
//! forwards it to all of its outbound connections, and hash-based
//! deduplication terminates the flood. Delivery is best effort; a broken
//! link silently degrades that one neighbor.
//!
//! Endpoints are abstract ([`Connector`], [`Listener`]) so the same node
//! runs over real TCP sockets or over in-memory duplex pipes in tests.

pub mod endpoint;
pub mod error;
pub mod node;
pub mod seen;
pub mod wire;

pub use endpoint::{
    ByteStream, Connector, Listener, PipeConnector, PipeListener, TcpConnector, TcpListener,
};
pub use error::{NetError, Result};
pub use node::{Node, NodeConfig};
pub use seen::SeenSet;
pub use wire::{decode_frame, encode_frame};
