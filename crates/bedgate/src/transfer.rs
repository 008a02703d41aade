//! Handing authenticated players off to a destination server.
//!
//! The gateway's job ends once a player is verified. What happens next is
//! decided by two collaborators injected into the server:
//!
//! - a [`ServerDirectory`] says where players should go right now;
//! - a [`SessionRouter`] starts gameplay and moves the player there.
//!
//! The defaults, [`StaticDirectory`] and [`TransferRouter`], send every
//! player to one configured server with a `Transfer` packet.

use std::future::Future;

use bedgate_protocol::{ClientboundPacket, PlayStatus};
use bedgate_session::Player;
use bedgate_transport::Connection;
use serde::{Deserialize, Serialize};

use crate::{GatewayError, PacketWriter};

/// A destination server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Message of the day.
    pub motd: String,
    /// Player limit.
    pub max_players: u32,
    /// Host name or IP.
    pub address: String,
    /// Port.
    pub port: u16,
}

/// Read-only view of where players are sent.
///
/// Shared by every connection task, so implementations must be cheap to
/// query and safe to call concurrently.
pub trait ServerDirectory: Send + Sync + 'static {
    /// The server new players should be handed to.
    fn current_target(&self) -> ServerInfo;
}

/// A directory that always answers with the same server.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    target: ServerInfo,
}

impl StaticDirectory {
    /// A directory pointing at `target`.
    pub fn new(target: ServerInfo) -> Self {
        Self { target }
    }
}

impl ServerDirectory for StaticDirectory {
    fn current_target(&self) -> ServerInfo {
        self.target.clone()
    }
}

/// Receives players once they have logged in.
///
/// # Example
///
/// ```rust
/// use bedgate::prelude::*;
///
/// /// Logs players instead of moving them anywhere.
/// struct LogOnly;
///
/// impl SessionRouter for LogOnly {
///     async fn begin_gameplay<C: Connection>(
///         &self,
///         _writer: &PacketWriter<'_, C>,
///         player: &Player,
///     ) -> Result<(), GatewayError> {
///         println!("{} finished resource packs", player.auth.display_name);
///         Ok(())
///     }
///
///     async fn migrate<C: Connection>(
///         &self,
///         _writer: &PacketWriter<'_, C>,
///         player: &Player,
///         target: &ServerInfo,
///     ) -> Result<(), GatewayError> {
///         println!("{} -> {}:{}", player.auth.display_name, target.address, target.port);
///         Ok(())
///     }
/// }
/// ```
pub trait SessionRouter: Send + Sync + 'static {
    /// Called when the client reports the resource-pack exchange
    /// finished.
    fn begin_gameplay<C: Connection>(
        &self,
        writer: &PacketWriter<'_, C>,
        player: &Player,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Called once the client's player is initialized, with the target
    /// the directory picked.
    fn migrate<C: Connection>(
        &self,
        writer: &PacketWriter<'_, C>,
        player: &Player,
        target: &ServerInfo,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Spawns the player, then transfers the client to the target server.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferRouter;

impl SessionRouter for TransferRouter {
    async fn begin_gameplay<C: Connection>(
        &self,
        writer: &PacketWriter<'_, C>,
        _player: &Player,
    ) -> Result<(), GatewayError> {
        writer
            .send(&ClientboundPacket::play_status(PlayStatus::PlayerSpawn))
            .await
    }

    async fn migrate<C: Connection>(
        &self,
        writer: &PacketWriter<'_, C>,
        player: &Player,
        target: &ServerInfo,
    ) -> Result<(), GatewayError> {
        tracing::info!(
            conn_id = %player.connection_id,
            player = %player.auth.display_name,
            address = %target.address,
            port = target.port,
            "transferring player"
        );
        writer
            .send(&ClientboundPacket::Transfer {
                address: target.address.clone(),
                port: target.port,
            })
            .await
    }
}
