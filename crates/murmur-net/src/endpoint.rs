//! Byte-stream endpoint abstractions.
//!
//! A node's outbound connections and inbound listeners are capability
//! traits over anonymous byte streams, so the same node runs over TCP in
//! production and over in-memory duplex pipes in simulation.

use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;

/// Object-safe combination of the async read/write traits.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

impl std::fmt::Debug for dyn AsyncStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AsyncStream")
    }
}

/// An anonymous duplex byte stream.
pub type ByteStream = Box<dyn AsyncStream>;

/// An outbound endpoint a node can open a byte stream to.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open the stream. Called once, lazily, by the node's writer task.
    async fn connect(&self) -> io::Result<ByteStream>;
}

/// An inbound endpoint a node accepts connections from.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Wait for the next inbound stream.
    async fn accept(&self) -> io::Result<ByteStream>;
}

/// Connector that dials a TCP address.
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    /// Create a connector for the given `host:port` address.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<ByteStream> {
        let stream = TcpStream::connect(&self.addr).await?;
        Ok(Box::new(stream))
    }
}

/// Listener over a bound TCP socket.
pub struct TcpListener {
    inner: tokio::net::TcpListener,
}

impl TcpListener {
    /// Bind to the given address.
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let inner = tokio::net::TcpListener::bind(addr).await?;
        Ok(Self { inner })
    }

    /// The locally bound address (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

#[async_trait]
impl Listener for TcpListener {
    async fn accept(&self) -> io::Result<ByteStream> {
        let (stream, _) = self.inner.accept().await?;
        Ok(Box::new(stream))
    }
}

/// Connector that yields one pre-made in-memory stream.
pub struct PipeConnector {
    stream: Mutex<Option<ByteStream>>,
}

impl PipeConnector {
    /// Wrap a stream, typically one end of `tokio::io::duplex`.
    pub fn new(stream: impl AsyncStream + 'static) -> Self {
        Self {
            stream: Mutex::new(Some(Box::new(stream))),
        }
    }
}

#[async_trait]
impl Connector for PipeConnector {
    async fn connect(&self) -> io::Result<ByteStream> {
        self.stream
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "pipe already taken"))
    }
}

/// Listener fed by hand: streams staged with [`PipeListener::push`] come
/// out of `accept` in order.
pub struct PipeListener {
    tx: mpsc::UnboundedSender<ByteStream>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ByteStream>>,
}

impl PipeListener {
    /// Create an empty pipe listener.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Stage a stream for the next `accept` call.
    pub fn push(&self, stream: impl AsyncStream + 'static) {
        let _ = self.tx.send(Box::new(stream));
    }
}

impl Default for PipeListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for PipeListener {
    async fn accept(&self) -> io::Result<ByteStream> {
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "pipe listener closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_pipe_connector_yields_once() {
        let (near, _far) = tokio::io::duplex(64);
        let connector = PipeConnector::new(near);

        assert!(connector.connect().await.is_ok());
        let second = connector.connect().await;
        assert_eq!(second.unwrap_err().kind(), io::ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn test_pipe_listener_accepts_in_order() {
        let listener = PipeListener::new();
        let (a_near, mut a_far) = tokio::io::duplex(64);
        let (b_near, mut b_far) = tokio::io::duplex(64);
        listener.push(a_near);
        listener.push(b_near);

        let mut first = listener.accept().await.unwrap();
        let mut second = listener.accept().await.unwrap();

        first.write_all(b"1").await.unwrap();
        second.write_all(b"2").await.unwrap();

        let mut buf = [0u8; 1];
        a_far.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"1");
        b_far.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"2");
    }

    #[tokio::test]
    async fn test_tcp_connector_and_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = TcpConnector::new(addr.to_string());

        let (outbound, inbound) = tokio::join!(connector.connect(), listener.accept());
        let mut outbound = outbound.unwrap();
        let mut inbound = inbound.unwrap();

        outbound.write_all(b"ping\n").await.unwrap();
        let mut buf = [0u8; 5];
        inbound.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping\n");
    }
}
