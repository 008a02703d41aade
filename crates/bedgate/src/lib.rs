//! # bedgate
//!
//! A login gateway for Bedrock Edition clients.
//!
//! bedgate accepts a client, negotiates its protocol version and frame
//! compression, verifies its signed identity chain and client data, runs
//! an empty resource-pack exchange, and hands the authenticated player to
//! a [`SessionRouter`] for transfer to a destination server.
//!
//! ```text
//! Transport (frames) → Protocol (packets) → Session (verification) → Gateway (handshake, handoff)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bedgate::prelude::*;
//!
//! # async fn start() -> Result<(), GatewayError> {
//! let gateway = Gateway::builder().build().await?;
//! gateway.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod login;
pub mod negotiate;
pub mod resource_pack;
mod server;
mod transfer;
mod writer;

pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use server::{Gateway, GatewayBuilder};
pub use transfer::{ServerDirectory, ServerInfo, SessionRouter, StaticDirectory, TransferRouter};
pub use writer::PacketWriter;

/// Everything needed to configure a gateway and plug in routing.
pub mod prelude {
    pub use crate::{
        ConfigError, Gateway, GatewayBuilder, GatewayConfig, GatewayError, PacketWriter,
        ServerDirectory, ServerInfo, SessionRouter, StaticDirectory, TransferRouter,
    };
    pub use bedgate_protocol::{
        ClientboundPacket, Codec, CodecRegistry, JsonCodec, PlayStatus, ResourcePackResponse,
        ServerboundPacket,
    };
    pub use bedgate_session::{
        AuthData, ClientData, LoginError, Player, RootMode, TrustPolicy,
    };
    pub use bedgate_transport::{Connection, ConnectionId, Transport};
}
