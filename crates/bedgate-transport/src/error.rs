//! Transport failures.
//!
//! Everything here ends the connection it happened on. The gateway never
//! reports these to the client; they only show up in its logs.

use std::io;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The WebSocket upgrade, a read, or a write failed.
    #[cfg(feature = "websocket")]
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// One side of the connection is already gone.
    #[error("connection closed: {0}")]
    Closed(&'static str),

    /// A frame could not be compressed or decompressed.
    #[error("bad compressed frame: {0}")]
    Compression(#[source] io::Error),

    /// The transport stopped accepting connections.
    #[error("transport shut down")]
    Shutdown,
}
