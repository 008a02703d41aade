//! Error types for the protocol layer.
//!
//! Each crate in bedgate defines its own error enum. A `ProtocolError`
//! always means a packet could not be turned into bytes or back; it says
//! nothing about whether the client is who it claims to be.

/// Errors that can occur while encoding or decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A packet could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A frame could not be parsed as a known packet.
    ///
    /// Common causes: malformed bytes, an unknown packet type, or
    /// missing fields.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
