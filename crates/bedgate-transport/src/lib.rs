//! Transport abstraction layer for bedgate.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! how frames reach the gateway, plus per-connection frame
//! [`Compression`].
//!
//! Implementations:
//!
//! - [`WebSocketTransport`]: binary WebSocket frames via `tokio-tungstenite`
//!   (behind the `websocket` feature, enabled by default)
//! - [`MemoryTransport`]: in-process channels, for tests and embedding
//!
//! Trait methods return `impl Future + Send` so that connection handlers
//! generic over a transport can still be spawned onto the Tokio runtime.

mod compression;
mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use compression::{
    Compression, CompressionAlgorithm, DEFAULT_COMPRESSION_THRESHOLD, MAX_DECOMPRESSED_FRAME,
};
pub use error::TransportError;
pub use memory::{
    Frame, MemoryConnection, MemoryConnector, MemoryPeer, MemoryTransport, memory_pair,
    memory_transport,
};
#[cfg(feature = "websocket")]
pub use websocket::{DEFAULT_UPGRADE_TIMEOUT, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of [`ConnectionId::next`]; shared by every transport in the process.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Names one client connection in logs and in the session's player record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Mostly useful in tests.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener that yields client connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Waits for the next client.
    ///
    /// [`TransportError::Shutdown`] means no more clients will arrive.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// Stops accepting clients. Later calls to `accept` return
    /// [`TransportError::Shutdown`] once queued clients are drained.
    fn shutdown(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// One client connection carrying whole frames both ways.
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame, compressed if compression is on.
    ///
    /// The frame is written before this future resolves; nothing is queued
    /// behind later calls. Callers rely on that to send a frame and then
    /// change the connection's compression.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Next frame from the client, decompressed if compression is on.
    ///
    /// `Ok(None)` once the client has gone away cleanly.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Turns on compression for every frame sent or received after this
    /// call returns.
    fn enable_compression(
        &self,
        compression: Compression,
    ) -> impl Future<Output = ()> + Send;

    /// Closes the connection. Frames already sent are still delivered.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Process-unique id of this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_next_is_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }
}
