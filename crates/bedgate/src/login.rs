//! The login state machine.
//!
//! One [`LoginHandler`] drives one connection through the handshake:
//!
//! ```text
//! RequestNetworkSettings ─▶ NetworkSettings (uncompressed), compression on
//! Login ─▶ chain ─▶ identity ─▶ client data ─▶ PlayStatus + ResourcePacksInfo
//! ResourcePackClientResponse ─▶ ResourcePackStack | begin gameplay
//! SetLocalPlayerAsInitialized ─▶ handoff
//! ```
//!
//! Each step returns a `Result`; this module is the only place a
//! [`LoginError`] becomes something the client sees.

use std::fmt;
use std::sync::Arc;

use bedgate_protocol::{
    ClientboundPacket, Codec, PlayStatus, ResourcePackResponse, ServerboundPacket,
};
use bedgate_session::{
    HandshakePhase, LoginError, Negotiation, Player, Session, extract_identity,
    verify_client_data,
};
use bedgate_transport::Connection;

use crate::negotiate::{negotiate, network_settings, session_compression};
use crate::resource_pack::{self, PackAction};
use crate::server::ServerState;
use crate::{GatewayError, PacketWriter, ServerDirectory, SessionRouter};

/// Whether the connection should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Close(CloseReason),
}

/// Why a connection ended, for the disconnect log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseReason {
    /// The client hung up.
    ClientClosed,
    /// No packet arrived in time.
    TimedOut,
    /// The login failed; carries [`LoginError::kind`].
    LoginFailed(&'static str),
    /// A packet arrived after the session had already been ended.
    AlreadyDisconnected,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientClosed => f.write_str("client closed"),
            Self::TimedOut => f.write_str("timed out"),
            Self::LoginFailed(kind) => write!(f, "login failed: {kind}"),
            Self::AlreadyDisconnected => f.write_str("already disconnected"),
        }
    }
}

/// Runs the handshake for a single connection.
pub(crate) struct LoginHandler<'a, C, R, D> {
    conn: &'a C,
    state: &'a ServerState<R, D>,
    session: Session,
}

impl<'a, C, R, D> LoginHandler<'a, C, R, D>
where
    C: Connection,
    R: SessionRouter,
    D: ServerDirectory,
{
    pub(crate) fn new(conn: &'a C, state: &'a ServerState<R, D>) -> Self {
        Self {
            conn,
            state,
            session: Session::new(conn.id()),
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// The codec for this session, or the registry default before
    /// negotiation.
    pub(crate) fn codec(&self) -> Arc<dyn Codec> {
        self.session
            .codec()
            .cloned()
            .unwrap_or_else(|| self.state.registry.default_codec())
    }

    fn writer(&self) -> PacketWriter<'a, C> {
        PacketWriter::new(self.conn, self.codec())
    }

    /// Handles one inbound packet.
    ///
    /// Login failures are turned into a disconnect here and reported as
    /// [`Flow::Close`] with the error kind; only transport and encoding
    /// errors are returned.
    pub(crate) async fn handle(
        &mut self,
        packet: ServerboundPacket,
    ) -> Result<Flow, GatewayError> {
        let conn_id = self.conn.id();
        match self.session.phase() {
            HandshakePhase::Disconnected => {
                tracing::debug!(
                    %conn_id,
                    packet = packet.name(),
                    "ignoring packet after disconnect"
                );
                return Ok(Flow::Close(CloseReason::AlreadyDisconnected));
            }
            HandshakePhase::Initialized => {
                tracing::debug!(
                    %conn_id,
                    packet = packet.name(),
                    "ignoring packet after handoff"
                );
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        let name = packet.name();
        let outcome = match packet {
            ServerboundPacket::RequestNetworkSettings { protocol_version } => {
                self.on_request_network_settings(protocol_version, name).await
            }
            ServerboundPacket::Login {
                protocol_version,
                chain_data,
                skin_data,
            } => self.on_login(protocol_version, &chain_data, &skin_data, name).await,
            ServerboundPacket::ResourcePackClientResponse { status, .. } => {
                self.on_resource_pack_response(status, name).await
            }
            ServerboundPacket::SetLocalPlayerAsInitialized { .. } => {
                self.on_local_player_initialized(name).await
            }
        };

        match outcome {
            Ok(flow) => Ok(flow),
            Err(GatewayError::Login(err)) => {
                let kind = err.kind();
                self.fail(err).await?;
                Ok(Flow::Close(CloseReason::LoginFailed(kind)))
            }
            Err(err) => Err(err),
        }
    }

    fn expect_phase(
        &self,
        phase: HandshakePhase,
        packet: &'static str,
    ) -> Result<(), LoginError> {
        if self.session.phase() == phase {
            Ok(())
        } else {
            Err(LoginError::UnexpectedPacket {
                packet,
                phase: self.session.phase(),
            })
        }
    }

    /// Picks the codec, recording a fallback when none matches.
    fn negotiate(&mut self, client_version: u32) -> Result<Arc<dyn Codec>, LoginError> {
        match negotiate(&self.state.registry, client_version) {
            Ok(codec) => {
                tracing::debug!(
                    conn_id = %self.conn.id(),
                    protocol = codec.protocol_version(),
                    version = codec.minecraft_version(),
                    "protocol negotiated"
                );
                self.session.complete_negotiation(Arc::clone(&codec));
                Ok(codec)
            }
            Err(err) => {
                self.session.reject_negotiation(self.state.registry.default_codec());
                Err(err)
            }
        }
    }

    async fn on_request_network_settings(
        &mut self,
        protocol_version: u32,
        name: &'static str,
    ) -> Result<Flow, GatewayError> {
        if let Negotiation::Completed { .. } = self.session.negotiation() {
            tracing::debug!(
                conn_id = %self.conn.id(),
                "ignoring repeated network settings request"
            );
            return Ok(Flow::Continue);
        }
        self.expect_phase(HandshakePhase::AwaitingLogin, name)?;
        self.negotiate(protocol_version)?;

        // The reply itself must go out uncompressed.
        self.writer().send(&network_settings()).await?;
        self.conn.enable_compression(session_compression()).await;
        self.session.enable_compression(session_compression());
        Ok(Flow::Continue)
    }

    async fn on_login(
        &mut self,
        protocol_version: u32,
        chain_data: &[u8],
        skin_data: &str,
        name: &'static str,
    ) -> Result<Flow, GatewayError> {
        self.expect_phase(HandshakePhase::AwaitingLogin, name)?;
        // Clients that skipped RequestNetworkSettings negotiate here.
        match self.session.codec().map(|codec| codec.protocol_version()) {
            None => {
                self.negotiate(protocol_version)?;
            }
            Some(negotiated) if negotiated != protocol_version => {
                return Err(LoginError::ProtocolMismatch {
                    client: protocol_version,
                    server: negotiated,
                }
                .into());
            }
            Some(_) => {}
        }

        let verified = self.state.verifier.verify(chain_data)?;
        let auth = extract_identity(&verified.payload)?;
        let client_data = verify_client_data(
            skin_data,
            &verified.identity_public_key,
            self.state.verifier.policy(),
        )?;

        self.session.advance(HandshakePhase::LoggedIn)?;
        let player = self.session.attach_player(Player {
            connection_id: self.conn.id(),
            auth,
            client_data,
            chain: verified.chain,
        })?;
        tracing::info!(
            conn_id = %player.connection_id,
            player = %player.auth.display_name,
            xuid = %player.auth.xuid,
            identity = %player.auth.identity,
            device_os = player.client_data.device_os,
            "player logged in"
        );

        let writer = self.writer();
        writer
            .send(&ClientboundPacket::play_status(PlayStatus::LoginSuccess))
            .await?;
        writer.send(&resource_pack::packs_info()).await?;
        self.session
            .advance(HandshakePhase::AwaitingResourcePackResponse)?;
        Ok(Flow::Continue)
    }

    async fn on_resource_pack_response(
        &mut self,
        status: ResourcePackResponse,
        name: &'static str,
    ) -> Result<Flow, GatewayError> {
        self.expect_phase(HandshakePhase::AwaitingResourcePackResponse, name)?;
        let writer = self.writer();
        match resource_pack::respond(status)? {
            PackAction::SendStack => writer.send(&resource_pack::empty_stack()).await?,
            PackAction::BeginGameplay => {
                let player = self.player(name)?;
                self.state.router.begin_gameplay(&writer, player).await?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn on_local_player_initialized(
        &mut self,
        name: &'static str,
    ) -> Result<Flow, GatewayError> {
        self.expect_phase(HandshakePhase::AwaitingResourcePackResponse, name)?;
        self.session.advance(HandshakePhase::Initialized)?;

        let target = self.state.directory.current_target();
        let writer = self.writer();
        let player = self.player(name)?;
        self.state.router.migrate(&writer, player, &target).await?;
        Ok(Flow::Continue)
    }

    fn player(&self, packet: &'static str) -> Result<&Player, LoginError> {
        self.session.player().ok_or(LoginError::UnexpectedPacket {
            packet,
            phase: self.session.phase(),
        })
    }

    /// Ends the session for `err`: at most one `PlayStatus`, then one
    /// `Disconnect`. The precise reason only goes to the log.
    async fn fail(&mut self, err: LoginError) -> Result<(), GatewayError> {
        tracing::warn!(
            conn_id = %self.conn.id(),
            kind = err.kind(),
            error = %err,
            phase = %self.session.phase(),
            "login failed"
        );
        self.session.disconnect();

        let writer = self.writer();
        if let Some(status) = err.play_status() {
            writer.send(&ClientboundPacket::play_status(status)).await?;
        }
        writer
            .send(&ClientboundPacket::disconnect(err.disconnect_message()))
            .await
    }
}
