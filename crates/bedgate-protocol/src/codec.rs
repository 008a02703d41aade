//! Version-specific codecs and the registry clients are matched against.
//!
//! A [`Codec`] pairs a protocol version with the means to turn packets into
//! bytes and back. The gateway picks one per session during negotiation;
//! the [`CodecRegistry`] answers "is this client version supported?".
//!
//! Byte-level packet layouts are supplied by whichever codec is
//! registered. [`JsonCodec`] is the built-in one: human-readable, which
//! makes handshakes easy to inspect in logs and tests.

use std::fmt;
use std::sync::Arc;

use crate::{ClientboundPacket, ProtocolError, ServerboundPacket};

/// Protocol version of the built-in default codec.
pub const DEFAULT_PROTOCOL_VERSION: u32 = 554;

/// Game version string matching [`DEFAULT_PROTOCOL_VERSION`].
pub const DEFAULT_MINECRAFT_VERSION: &str = "1.19.30";

/// Encodes outbound and decodes inbound packets for one protocol version.
///
/// Object safe, so sessions can hold an `Arc<dyn Codec>` picked at
/// runtime.
pub trait Codec: Send + Sync + fmt::Debug + 'static {
    /// The protocol version this codec speaks.
    fn protocol_version(&self) -> u32;

    /// The game version this codec corresponds to, for logs.
    fn minecraft_version(&self) -> &str;

    /// Serializes a packet for the client.
    fn encode(&self, packet: &ClientboundPacket) -> Result<Vec<u8>, ProtocolError>;

    /// Parses a frame received from the client.
    fn decode(&self, data: &[u8]) -> Result<ServerboundPacket, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes packets as internally tagged JSON.
///
/// ```rust
/// use bedgate_protocol::{Codec, ClientboundPacket, JsonCodec, PlayStatus};
///
/// let codec = JsonCodec::default();
/// let bytes = codec
///     .encode(&ClientboundPacket::play_status(PlayStatus::LoginSuccess))
///     .unwrap();
/// assert_eq!(bytes, br#"{"type":"PlayStatus","status":"LOGIN_SUCCESS"}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    protocol_version: u32,
    minecraft_version: &'static str,
}

impl JsonCodec {
    /// A JSON codec reporting the given versions.
    pub fn new(protocol_version: u32, minecraft_version: &'static str) -> Self {
        Self {
            protocol_version,
            minecraft_version,
        }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOCOL_VERSION, DEFAULT_MINECRAFT_VERSION)
    }
}

impl Codec for JsonCodec {
    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn minecraft_version(&self) -> &str {
        self.minecraft_version
    }

    fn encode(&self, packet: &ClientboundPacket) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(packet).map_err(ProtocolError::Encode)
    }

    fn decode(&self, data: &[u8]) -> Result<ServerboundPacket, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// CodecRegistry
// ---------------------------------------------------------------------------

/// The set of codecs the gateway accepts, ordered by protocol version.
///
/// The newest codec is the default: it encodes error packets for clients
/// no codec matches, and its version decides whether such a client is
/// told that it or the server is out of date.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    /// Sorted ascending by protocol version, never empty.
    codecs: Vec<Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// A registry holding a single codec.
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codecs: vec![codec],
        }
    }

    /// Adds a codec, replacing any codec with the same protocol version.
    pub fn with(mut self, codec: Arc<dyn Codec>) -> Self {
        let version = codec.protocol_version();
        self.codecs.retain(|c| c.protocol_version() != version);
        let at = self
            .codecs
            .partition_point(|c| c.protocol_version() < version);
        self.codecs.insert(at, codec);
        self
    }

    /// Finds the codec for exactly this protocol version.
    pub fn lookup(&self, protocol_version: u32) -> Option<Arc<dyn Codec>> {
        self.codecs
            .iter()
            .find(|c| c.protocol_version() == protocol_version)
            .cloned()
    }

    /// The newest registered codec.
    pub fn default_codec(&self) -> Arc<dyn Codec> {
        // Non-empty by construction.
        Arc::clone(&self.codecs[self.codecs.len() - 1])
    }

    /// All supported protocol versions, oldest first.
    pub fn supported_versions(&self) -> Vec<u32> {
        self.codecs.iter().map(|c| c.protocol_version()).collect()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new(Arc::new(JsonCodec::default()))
    }
}
