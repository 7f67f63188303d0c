//! The gossip node: dedup, local delivery, flood-forward.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use murmur_core::Action;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::endpoint::{ByteStream, Connector, Listener};
use crate::error::{NetError, Result};
use crate::seen::SeenSet;
use crate::wire;

/// Construction-time parameters for a [`Node`].
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Identifier used in diagnostics only; carries no protocol meaning.
    pub id: u64,
    /// Retention bound for the seen-hash set. None keeps every hash
    /// forever, which is correct but unbounded for long-lived nodes.
    pub seen_capacity: Option<NonZeroUsize>,
    /// Recompute and check the hash of every inbound action, dropping
    /// frames whose hash does not match their content.
    pub verify_incoming: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: 0,
            seen_capacity: None,
            verify_incoming: true,
        }
    }
}

/// State shared between the node handle and its background tasks.
struct Shared {
    config: NodeConfig,
    seen: Mutex<SeenSet>,
    /// One frame sender per registered outbound connection.
    outbound: Mutex<Vec<mpsc::UnboundedSender<Bytes>>>,
    delivery_tx: mpsc::UnboundedSender<Action>,
    /// Accept loops, writer tasks, and per-connection read loops.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Shared {
    /// Handle one inbound frame: decode, dedup, deliver, re-flood.
    fn ingest(&self, frame: &[u8]) {
        let action = match wire::decode_frame(frame) {
            Ok(action) => action,
            Err(e) => {
                warn!(node = self.config.id, error = %e, "dropping malformed frame");
                return;
            }
        };
        if self.config.verify_incoming {
            if let Err(e) = action.verify_hash() {
                warn!(node = self.config.id, error = %e, "dropping action with bad hash");
                return;
            }
        }
        if !self.seen.lock().unwrap().insert(action.hash) {
            return;
        }
        // Forward the frame bytes as received; re-encoding would only
        // risk changing them.
        let frame = Bytes::copy_from_slice(frame);
        let _ = self.delivery_tx.send(action);
        self.fan_out(frame);
    }

    /// Queue a frame on every outbound connection. A closed writer task
    /// just means that neighbor is gone; the flood continues.
    fn fan_out(&self, frame: Bytes) {
        for tx in self.outbound.lock().unwrap().iter() {
            let _ = tx.send(frame.clone());
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.tasks.lock().unwrap().push(handle);
    }
}

/// A gossip participant.
///
/// Owns outbound connections (fan-out targets) and inbound listeners
/// (sources of flooded traffic), a seen-hash set, and an unbounded local
/// delivery queue consumed through [`Node::read`].
pub struct Node {
    shared: Arc<Shared>,
    delivery_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Action>>,
}

impl Node {
    /// Create a node with no connections or listeners attached.
    pub fn new(config: NodeConfig) -> Self {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        let seen_capacity = config.seen_capacity;
        Self {
            shared: Arc::new(Shared {
                config,
                seen: Mutex::new(SeenSet::new(seen_capacity)),
                outbound: Mutex::new(Vec::new()),
                delivery_tx,
                tasks: Mutex::new(Vec::new()),
            }),
            delivery_rx: tokio::sync::Mutex::new(delivery_rx),
        }
    }

    /// This node's diagnostic identifier.
    pub fn id(&self) -> u64 {
        self.shared.config.id
    }

    /// Register an outbound connection.
    ///
    /// Purely structural; the stream is opened lazily by a writer task
    /// when the first frame is queued. Connect and write failures are
    /// logged and silently degrade delivery to that one neighbor.
    pub fn add_connection(&self, connector: impl Connector + 'static) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        self.shared.outbound.lock().unwrap().push(tx);

        let id = self.shared.config.id;
        let handle = tokio::spawn(async move {
            let Some(first) = rx.recv().await else {
                return;
            };
            let mut stream = match connector.connect().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(node = id, error = %e, "outbound connect failed");
                    return;
                }
            };
            if stream.write_all(&first).await.is_err() {
                warn!(node = id, "outbound write failed");
                return;
            }
            while let Some(frame) = rx.recv().await {
                if let Err(e) = stream.write_all(&frame).await {
                    warn!(node = id, error = %e, "outbound write failed");
                    return;
                }
            }
        });
        self.shared.track(handle);
    }

    /// Register an inbound listener and start accepting from it.
    ///
    /// Each accepted stream gets its own read loop; a malformed frame or
    /// a broken stream ends only that connection.
    pub fn add_listener(&self, listener: impl Listener + 'static) {
        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok(stream) => {
                        let shared_conn = shared.clone();
                        let conn =
                            tokio::spawn(async move { read_loop(shared_conn, stream).await });
                        shared.track(conn);
                    }
                    Err(e) => {
                        warn!(node = shared.config.id, error = %e, "listener closed");
                        return;
                    }
                }
            }
        });
        self.shared.track(handle);
    }

    /// Inject an action at this node and flood it to the graph.
    ///
    /// Returns [`NetError::DuplicateAction`] without performing any I/O
    /// if the hash has already been seen. Otherwise the action is marked
    /// seen, delivered to this node's own [`Node::read`] stream, and
    /// queued on every outbound connection. Per-connection write
    /// failures are not surfaced here; only encoding can fail.
    pub fn write(&self, action: &Action) -> Result<()> {
        let frame = wire::encode_frame(action)?;
        if !self.shared.seen.lock().unwrap().insert(action.hash) {
            return Err(NetError::DuplicateAction(action.hash));
        }
        let _ = self.shared.delivery_tx.send(action.clone());
        self.shared.fan_out(Bytes::from(frame));
        Ok(())
    }

    /// Wait for the next action delivered to this node.
    ///
    /// Every delivered action comes out exactly once, in delivery order.
    pub async fn read(&self) -> Result<Action> {
        let mut rx = self.delivery_rx.lock().await;
        rx.recv().await.ok_or(NetError::Closed)
    }

    /// Like [`Node::read`] but gives up after `timeout`, returning None.
    pub async fn read_timeout(&self, timeout: Duration) -> Result<Option<Action>> {
        let mut rx = self.delivery_rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(action)) => Ok(Some(action)),
            Ok(None) => Err(NetError::Closed),
            Err(_) => Ok(None),
        }
    }

    /// Number of registered outbound connections.
    pub fn connection_count(&self) -> usize {
        self.shared.outbound.lock().unwrap().len()
    }

    /// Abort every background task this node has spawned.
    ///
    /// Delivery semantics are unchanged for actions already queued;
    /// nothing new arrives afterwards.
    pub fn shutdown(&self) {
        for handle in self.shared.tasks.lock().unwrap().drain(..) {
            handle.abort();
        }
    }
}

/// Read newline-delimited frames from one inbound stream until it
/// closes or errors.
async fn read_loop(shared: Arc<Shared>, stream: ByteStream) {
    let mut reader = BufReader::new(stream);
    let mut frame = Vec::new();
    loop {
        frame.clear();
        match reader.read_until(b'\n', &mut frame).await {
            Ok(0) => return,
            Ok(_) => shared.ingest(&frame),
            Err(e) => {
                warn!(node = shared.config.id, error = %e, "connection read failed");
                return;
            }
        }
    }
}
