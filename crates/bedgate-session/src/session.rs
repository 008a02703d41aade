//! Per-connection login state.
//!
//! A [`Session`] is the gateway's record of one connection while it logs
//! in. It is owned by that connection's task and dropped when the
//! connection ends, so nothing in here is shared or locked.

use std::fmt;
use std::sync::Arc;

use bedgate_protocol::Codec;
use bedgate_transport::{Compression, ConnectionId};

use crate::{AuthData, ClientData, IdentityChain, LoginError};

// ---------------------------------------------------------------------------
// HandshakePhase
// ---------------------------------------------------------------------------

/// Where a session is in the login handshake.
///
/// ```text
///   AwaitingLogin ──▶ LoggedIn ──▶ AwaitingResourcePackResponse ──▶ Initialized
///        │               │                     │                        │
///        └───────────────┴──────────┬──────────┴────────────────────────┘
///                                   ▼
///                              Disconnected
/// ```
///
/// Phases are ordered; a session only ever moves to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandshakePhase {
    /// Waiting for `Login` (and optionally `RequestNetworkSettings`).
    AwaitingLogin,
    /// The chain and client data verified.
    LoggedIn,
    /// Packs were offered; waiting for the client's answer.
    AwaitingResourcePackResponse,
    /// The client's player is in the world and has been handed off.
    Initialized,
    /// The session ended. Terminal.
    Disconnected,
}

impl fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingLogin => "awaiting login",
            Self::LoggedIn => "logged in",
            Self::AwaitingResourcePackResponse => "awaiting resource pack response",
            Self::Initialized => "initialized",
            Self::Disconnected => "disconnected",
        })
    }
}

// ---------------------------------------------------------------------------
// Negotiation
// ---------------------------------------------------------------------------

/// Outcome of protocol negotiation for one session.
#[derive(Debug, Clone)]
pub enum Negotiation {
    /// No version has been presented yet.
    Pending,
    /// No codec matched; `fallback` encodes the packets that say so.
    Rejected {
        /// Codec used for the rejection packets.
        fallback: Arc<dyn Codec>,
    },
    /// A codec was picked.
    Completed {
        /// The session's codec.
        codec: Arc<dyn Codec>,
        /// Frame compression, once `NetworkSettings` has been sent.
        compression: Option<Compression>,
    },
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A client that finished login. At most one exists per session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Connection the player arrived on.
    pub connection_id: ConnectionId,
    /// Verified identity.
    pub auth: AuthData,
    /// Verified device and skin data.
    pub client_data: ClientData,
    /// The chain the identity came from.
    pub chain: IdentityChain,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Login state for a single connection.
#[derive(Debug)]
pub struct Session {
    connection_id: ConnectionId,
    phase: HandshakePhase,
    negotiation: Negotiation,
    player: Option<Player>,
}

impl Session {
    /// A fresh session awaiting login.
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            phase: HandshakePhase::AwaitingLogin,
            negotiation: Negotiation::Pending,
            player: None,
        }
    }

    /// The connection this session belongs to.
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// The current phase.
    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// The negotiation state.
    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// The logged-in player, once login has succeeded.
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    /// The codec to encode with: the negotiated one, or the fallback after
    /// a rejection. `None` while negotiation is pending.
    pub fn codec(&self) -> Option<&Arc<dyn Codec>> {
        match &self.negotiation {
            Negotiation::Pending => None,
            Negotiation::Rejected { fallback } => Some(fallback),
            Negotiation::Completed { codec, .. } => Some(codec),
        }
    }

    /// Whether frames on this session are compressed.
    pub fn compression_enabled(&self) -> bool {
        matches!(
            self.negotiation,
            Negotiation::Completed {
                compression: Some(_),
                ..
            }
        )
    }

    /// Moves to `next`, which must not be earlier than the current phase.
    ///
    /// Nothing leaves [`HandshakePhase::Disconnected`].
    pub fn advance(&mut self, next: HandshakePhase) -> Result<(), LoginError> {
        if next < self.phase || self.phase == HandshakePhase::Disconnected {
            return Err(LoginError::PhaseRegression {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!(conn_id = %self.connection_id, from = %self.phase, to = %next, "phase");
        self.phase = next;
        Ok(())
    }

    /// Records the negotiated codec. Returns `false`, changing nothing, if
    /// negotiation already finished.
    pub fn complete_negotiation(&mut self, codec: Arc<dyn Codec>) -> bool {
        if !matches!(self.negotiation, Negotiation::Pending) {
            return false;
        }
        self.negotiation = Negotiation::Completed {
            codec,
            compression: None,
        };
        true
    }

    /// Records that compression is on. Only meaningful after
    /// [`complete_negotiation`](Self::complete_negotiation).
    pub fn enable_compression(&mut self, settings: Compression) {
        if let Negotiation::Completed { compression, .. } = &mut self.negotiation {
            *compression = Some(settings);
        }
    }

    /// Records that no codec matched.
    pub fn reject_negotiation(&mut self, fallback: Arc<dyn Codec>) {
        self.negotiation = Negotiation::Rejected { fallback };
    }

    /// Attaches the player after a successful login. A session gets at
    /// most one.
    pub fn attach_player(&mut self, player: Player) -> Result<&Player, LoginError> {
        if self.player.is_some() {
            return Err(LoginError::DuplicateLogin);
        }
        Ok(self.player.insert(player))
    }

    /// Ends the session. Calling it again has no effect.
    pub fn disconnect(&mut self) {
        self.phase = HandshakePhase::Disconnected;
    }

    /// Whether the session has ended.
    pub fn is_disconnected(&self) -> bool {
        self.phase == HandshakePhase::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use bedgate_protocol::JsonCodec;
    use uuid::Uuid;

    use super::*;

    fn session() -> Session {
        Session::new(ConnectionId::new(1))
    }

    fn player() -> Player {
        Player {
            connection_id: ConnectionId::new(1),
            auth: AuthData {
                display_name: "Steve".into(),
                identity: Uuid::nil(),
                xuid: "123".into(),
            },
            client_data: ClientData::default(),
            chain: IdentityChain::from_links(vec!["a.b.c".into()]).unwrap(),
        }
    }

    #[test]
    fn test_new_session_awaits_login_without_codec() {
        let session = session();
        assert_eq!(session.phase(), HandshakePhase::AwaitingLogin);
        assert!(session.codec().is_none());
        assert!(!session.compression_enabled());
        assert!(session.player().is_none());
    }

    #[test]
    fn test_advance_forward_succeeds() {
        let mut session = session();
        session.advance(HandshakePhase::LoggedIn).unwrap();
        session
            .advance(HandshakePhase::AwaitingResourcePackResponse)
            .unwrap();
        // Staying put is allowed.
        session
            .advance(HandshakePhase::AwaitingResourcePackResponse)
            .unwrap();
        assert_eq!(session.phase(), HandshakePhase::AwaitingResourcePackResponse);
    }

    #[test]
    fn test_advance_backwards_is_regression() {
        let mut session = session();
        session.advance(HandshakePhase::Initialized).unwrap();
        let err = session.advance(HandshakePhase::LoggedIn).unwrap_err();
        assert_eq!(
            err,
            LoginError::PhaseRegression {
                from: HandshakePhase::Initialized,
                to: HandshakePhase::LoggedIn,
            }
        );
        assert_eq!(session.phase(), HandshakePhase::Initialized);
    }

    #[test]
    fn test_advance_after_disconnect_fails() {
        let mut session = session();
        session.disconnect();
        session.disconnect();
        assert!(session.is_disconnected());
        assert!(session.advance(HandshakePhase::Disconnected).is_err());
    }

    #[test]
    fn test_complete_negotiation_only_once() {
        let mut session = session();
        assert!(session.complete_negotiation(Arc::new(JsonCodec::default())));
        assert!(!session.complete_negotiation(Arc::new(JsonCodec::new(1, "old"))));
        assert_eq!(session.codec().unwrap().protocol_version(), 554);
    }

    #[test]
    fn test_enable_compression_after_negotiation() {
        let mut session = session();
        session.enable_compression(Compression::zlib());
        assert!(!session.compression_enabled());

        session.complete_negotiation(Arc::new(JsonCodec::default()));
        session.enable_compression(Compression::zlib());
        assert!(session.compression_enabled());
    }

    #[test]
    fn test_reject_negotiation_keeps_fallback_codec() {
        let mut session = session();
        session.reject_negotiation(Arc::new(JsonCodec::default()));
        assert!(matches!(session.negotiation(), Negotiation::Rejected { .. }));
        assert!(session.codec().is_some());
        assert!(!session.complete_negotiation(Arc::new(JsonCodec::default())));
    }

    #[test]
    fn test_attach_player_twice_is_duplicate() {
        let mut session = session();
        assert_eq!(session.attach_player(player()).unwrap().auth.display_name, "Steve");
        assert_eq!(
            session.attach_player(player()).unwrap_err(),
            LoginError::DuplicateLogin
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(
            HandshakePhase::AwaitingResourcePackResponse.to_string(),
            "awaiting resource pack response"
        );
    }
}
