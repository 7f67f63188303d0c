//! Deterministic multi-node topologies for simulation.
//!
//! The builders wire gossip nodes together with in-memory duplex pipes
//! instead of real sockets, producing the same graph on every run. The
//! [`Network`] wrapper indexes the built nodes and pushes actions in at
//! node 0.

pub mod error;
pub mod network;
pub mod topology;

pub use error::{Result, SimError};
pub use network::Network;
pub use topology::{LoopBuilder, WebBuilder};
