//! Encoding packets onto a connection.

use std::sync::Arc;

use bedgate_protocol::{ClientboundPacket, Codec};
use bedgate_transport::Connection;

use crate::GatewayError;

/// Sends packets to one client with the session's codec.
///
/// Handed to [`SessionRouter`](crate::SessionRouter) implementations so
/// they can talk to the client without owning the connection.
pub struct PacketWriter<'a, C> {
    conn: &'a C,
    codec: Arc<dyn Codec>,
}

impl<'a, C: Connection> PacketWriter<'a, C> {
    /// A writer that encodes with `codec`.
    pub fn new(conn: &'a C, codec: Arc<dyn Codec>) -> Self {
        Self { conn, codec }
    }

    /// Encodes and sends one packet. Resolves once the frame is written.
    pub async fn send(&self, packet: &ClientboundPacket) -> Result<(), GatewayError> {
        let bytes = self.codec.encode(packet)?;
        tracing::trace!(conn_id = %self.conn.id(), packet = packet.name(), "send");
        self.conn.send(&bytes).await?;
        Ok(())
    }

    /// The codec packets are encoded with.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }
}
