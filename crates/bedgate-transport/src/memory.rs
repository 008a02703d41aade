//! In-process transport built on Tokio channels.
//!
//! A [`MemoryConnection`] is the server half; its [`MemoryPeer`] plays the
//! client. Frames are passed uncompressed: the peer instead sees whether
//! compression was active when each frame was sent, which is what tests
//! about negotiation ordering need to observe.

use tokio::sync::{Mutex, mpsc};

use crate::{Compression, Connection, ConnectionId, Transport, TransportError};

/// A frame observed by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The uncompressed payload.
    pub data: Vec<u8>,
    /// Whether the connection had compression enabled when this frame
    /// was sent.
    pub compressed: bool,
}

/// Server half of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    compression: Mutex<Option<Compression>>,
}

impl MemoryConnection {
    /// Returns the compression currently applied to this connection.
    pub async fn compression(&self) -> Option<Compression> {
        *self.compression.lock().await
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let compressed = self.compression.lock().await.is_some();
        let outbound = self.outbound.lock().await;
        let tx = outbound.as_ref().ok_or_else(|| {
            TransportError::Closed("closed locally")
        })?;
        tx.send(Frame {
            data: data.to_vec(),
            compressed,
        })
        .map_err(|_| TransportError::Closed("peer dropped"))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn enable_compression(&self, compression: Compression) {
        *self.compression.lock().await = Some(compression);
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping the sender ends the peer's receive stream.
        self.outbound.lock().await.take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Client half of an in-memory connection.
pub struct MemoryPeer {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl MemoryPeer {
    /// Sends a frame to the server half.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or_else(|| {
            TransportError::Closed("peer closed")
        })?;
        tx.send(data.into())
            .map_err(|_| TransportError::Closed("server dropped"))
    }

    /// Waits for the next frame. `None` once the server closed or dropped
    /// its half and every pending frame has been read.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Returns the next frame if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    /// Closes the client side; the server's `recv` then returns `Ok(None)`.
    pub fn close(&mut self) {
        self.tx.take();
    }
}

/// Creates a connected server/client pair.
pub fn memory_pair() -> (MemoryConnection, MemoryPeer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();

    let conn = MemoryConnection {
        id: ConnectionId::next(),
        inbound: Mutex::new(server_rx),
        outbound: Mutex::new(Some(server_tx)),
        compression: Mutex::new(None),
    };
    let peer = MemoryPeer {
        tx: Some(client_tx),
        rx: client_rx,
    };
    (conn, peer)
}

/// A [`Transport`] whose connections are opened through a
/// [`MemoryConnector`].
pub struct MemoryTransport {
    incoming: mpsc::UnboundedReceiver<MemoryConnection>,
}

/// Opens connections to a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryConnector {
    tx: mpsc::UnboundedSender<MemoryConnection>,
}

impl MemoryConnector {
    /// Opens a new connection and returns its client half.
    pub fn connect(&self) -> Result<MemoryPeer, TransportError> {
        let (conn, peer) = memory_pair();
        self.tx.send(conn).map_err(|_| TransportError::Shutdown)?;
        Ok(peer)
    }
}

/// Creates a transport and the connector that feeds it.
pub fn memory_transport() -> (MemoryTransport, MemoryConnector) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemoryTransport { incoming: rx }, MemoryConnector { tx })
}

impl Transport for MemoryTransport {
    type Connection = MemoryConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let conn = self.incoming.recv().await.ok_or(TransportError::Shutdown)?;
        tracing::debug!(id = %conn.id(), "accepted in-memory connection");
        Ok(conn)
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        // Connections already queued are still handed out.
        self.incoming.close();
        Ok(())
    }
}
