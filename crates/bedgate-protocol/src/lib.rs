//! Wire protocol for bedgate.
//!
//! This crate defines what the gateway and a connecting client say to each
//! other before the client is handed off:
//!
//! - **Types** ([`ServerboundPacket`], [`ClientboundPacket`], [`PlayStatus`],
//!   [`ResourcePackResponse`]): the login-phase packets.
//! - **Codecs** ([`Codec`] trait, [`JsonCodec`], [`CodecRegistry`]): the
//!   version-specific encoders a session negotiates.
//! - **Errors** ([`ProtocolError`]): what can go wrong turning packets into
//!   bytes and back.
//!
//! ```text
//! Transport (frames) → Protocol (packets) → Session (login state)
//! ```

mod codec;
mod error;
mod types;

pub use bedgate_transport::CompressionAlgorithm;
pub use codec::{
    Codec, CodecRegistry, DEFAULT_MINECRAFT_VERSION, DEFAULT_PROTOCOL_VERSION, JsonCodec,
};
pub use error::ProtocolError;
pub use types::{ClientboundPacket, PackEntry, PlayStatus, ResourcePackResponse, ServerboundPacket};
