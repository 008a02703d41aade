//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Each binary WebSocket message is one frame. The stream is split so a
//! pending `recv` never blocks a `send` on the same connection.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Compression, Connection, ConnectionId, Transport, TransportError};

type WsStream = WebSocketStream<TcpStream>;

/// How long a TCP client may take to finish the WebSocket upgrade.
pub const DEFAULT_UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upgraded connections waiting for `accept`.
const ACCEPT_BACKLOG: usize = 64;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
///
/// A background task accepts TCP clients and runs each upgrade in its own
/// task under a timeout, so a client that never finishes the upgrade
/// cannot hold up anyone else.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    incoming: mpsc::Receiver<WebSocketConnection>,
    acceptor: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport with [`DEFAULT_UPGRADE_TIMEOUT`].
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        Self::bind_with_upgrade_timeout(addr, DEFAULT_UPGRADE_TIMEOUT).await
    }

    /// Binds a new WebSocket transport; clients that have not completed
    /// the upgrade within `upgrade_timeout` are dropped.
    pub async fn bind_with_upgrade_timeout(
        addr: &str,
        upgrade_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let bind_err = |source| TransportError::Bind {
            addr: addr.to_owned(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (tx, incoming) = mpsc::channel(ACCEPT_BACKLOG);
        let acceptor = tokio::spawn(accept_loop(listener, tx, upgrade_timeout));
        Ok(Self {
            local_addr,
            incoming,
            acceptor,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::Sender<WebSocketConnection>,
    upgrade_timeout: Duration,
) {
    loop {
        let (stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "tcp accept failed");
                    continue;
                }
            },
            _ = tx.closed() => return,
        };

        let tx = tx.clone();
        tokio::spawn(async move {
            let upgrade = tokio_tungstenite::accept_async(stream);
            let ws = match tokio::time::timeout(upgrade_timeout, upgrade).await {
                Ok(Ok(ws)) => ws,
                Ok(Err(e)) => {
                    tracing::debug!(%addr, error = %e, "websocket upgrade failed");
                    return;
                }
                Err(_) => {
                    tracing::debug!(%addr, "websocket upgrade timed out");
                    return;
                }
            };

            let conn = WebSocketConnection::new(ws);
            tracing::debug!(id = %conn.id, %addr, "accepted WebSocket connection");
            // Fails only once the transport is gone; the client is dropped.
            let _ = tx.send(conn).await;
        });
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        self.incoming.recv().await.ok_or(TransportError::Shutdown)
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.acceptor.abort();
        self.incoming.close();
        tracing::info!(local_addr = %self.local_addr, "WebSocket transport stopped");
        Ok(())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    compression: Mutex<Option<Compression>>,
}

impl WebSocketConnection {
    fn new(ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id: ConnectionId::next(),
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            compression: Mutex::new(None),
        }
    }
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let frame = match *self.compression.lock().await {
            Some(compression) => compression
                .compress(data)
                .map_err(TransportError::Compression)?,
            None => data.to_vec(),
        };

        self.sink
            .lock()
            .await
            .send(Message::Binary(frame.into()))
            .await?;
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let frame = loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => break Vec::from(data),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Text frames are not part of the protocol; skip them
                // along with ping/pong.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        };

        match *self.compression.lock().await {
            Some(compression) => compression
                .decompress(&frame)
                .map(Some)
                .map_err(TransportError::Compression),
            None => Ok(Some(frame)),
        }
    }

    async fn enable_compression(&self, compression: Compression) {
        *self.compression.lock().await = Some(compression);
        tracing::debug!(id = %self.id, ?compression, "compression enabled");
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await?;
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
