//! Error types for login verification.
//!
//! Every step of a login returns one of these instead of aborting. The
//! variant names the precise reason for the gateway's own logs; the
//! client only ever sees [`LoginError::disconnect_message`], which for
//! every security-relevant kind is the same generic string.

use bedgate_protocol::PlayStatus;

use crate::HandshakePhase;

/// Shown to clients whose login fails for any verification reason.
pub const GENERIC_DISCONNECT: &str = "disconnectionScreen.internalError.cantConnect";
/// Shown to clients newer than every supported codec.
pub const OUTDATED_SERVER_DISCONNECT: &str = "disconnectionScreen.outdatedServer";
/// Shown to clients older than the default codec.
pub const OUTDATED_CLIENT_DISCONNECT: &str = "disconnectionScreen.outdatedClient";
/// Shown when the resource-pack exchange goes wrong.
pub const RESOURCE_PACK_DISCONNECT: &str = "disconnectionScreen.resourcePack";

/// Reasons a login can fail. Every one of them ends the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// No registered codec speaks the client's protocol version.
    #[error("unsupported protocol version {client} (server default {server})")]
    ProtocolMismatch {
        /// Version the client declared.
        client: u32,
        /// Version of the server's default codec.
        server: u32,
    },

    /// The chain document is not JSON, has no `chain` list, or the list
    /// is empty or holds non-strings.
    #[error("malformed chain data: {0}")]
    MalformedChainData(String),

    /// A chain link failed to parse, was signed by the wrong key, failed
    /// its signature or time checks, or the chain never reached a
    /// trusted root.
    #[error("chain verification failed at link {link}: {reason}")]
    ChainVerificationFailure {
        /// Zero-based index of the offending link.
        link: usize,
        /// What went wrong.
        reason: String,
    },

    /// The final link has no string `identityPublicKey`.
    #[error("final chain link has no identityPublicKey")]
    MissingIdentityField,

    /// `extraData` or one of its identity fields is absent or malformed.
    #[error("missing or malformed client data field `{0}`")]
    MissingClientDataField(&'static str),

    /// The client-data token is not signed by the identity key.
    #[error("client data signature mismatch: {0}")]
    SkinSignatureMismatch(String),

    /// The client-data payload verified but has the wrong shape.
    #[error("malformed client data: {0}")]
    MalformedClientData(String),

    /// The client answered the pack offer with a status the handshake
    /// does not allow.
    #[error("unexpected resource pack response status {0}")]
    ResourcePackProtocolViolation(u8),

    /// A packet arrived that is not legal in the current phase.
    #[error("unexpected {packet} packet while {phase}")]
    UnexpectedPacket {
        /// Name of the packet.
        packet: &'static str,
        /// Phase the session was in.
        phase: HandshakePhase,
    },

    /// The session was asked to move backwards.
    #[error("handshake phase cannot move from {from} to {to}")]
    PhaseRegression {
        /// Current phase.
        from: HandshakePhase,
        /// Requested phase.
        to: HandshakePhase,
    },

    /// A player was already attached to this session.
    #[error("session already has a logged-in player")]
    DuplicateLogin,
}

impl LoginError {
    /// Stable snake_case name of the variant, for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProtocolMismatch { .. } => "protocol_mismatch",
            Self::MalformedChainData(_) => "malformed_chain_data",
            Self::ChainVerificationFailure { .. } => "chain_verification_failure",
            Self::MissingIdentityField => "missing_identity_field",
            Self::MissingClientDataField(_) => "missing_client_data_field",
            Self::SkinSignatureMismatch(_) => "skin_signature_mismatch",
            Self::MalformedClientData(_) => "malformed_client_data",
            Self::ResourcePackProtocolViolation(_) => "resource_pack_protocol_violation",
            Self::UnexpectedPacket { .. } => "unexpected_packet",
            Self::PhaseRegression { .. } => "phase_regression",
            Self::DuplicateLogin => "duplicate_login",
        }
    }

    /// The only text about this failure the client gets to see.
    pub fn disconnect_message(&self) -> &'static str {
        match self {
            Self::ProtocolMismatch { client, server } if client > server => {
                OUTDATED_SERVER_DISCONNECT
            }
            Self::ProtocolMismatch { client, server } if client < server => {
                OUTDATED_CLIENT_DISCONNECT
            }
            Self::ResourcePackProtocolViolation(_) => RESOURCE_PACK_DISCONNECT,
            _ => GENERIC_DISCONNECT,
        }
    }

    /// The `PlayStatus` sent ahead of the disconnect, if any.
    pub fn play_status(&self) -> Option<PlayStatus> {
        match self {
            Self::ProtocolMismatch { client, server } if client > server => {
                Some(PlayStatus::LoginFailedServerOld)
            }
            Self::ProtocolMismatch { client, server } if client < server => {
                Some(PlayStatus::LoginFailedClientOld)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_mismatch_newer_client_is_server_old() {
        let err = LoginError::ProtocolMismatch {
            client: 600,
            server: 554,
        };
        assert_eq!(err.play_status(), Some(PlayStatus::LoginFailedServerOld));
        assert_eq!(err.disconnect_message(), OUTDATED_SERVER_DISCONNECT);
    }

    #[test]
    fn test_protocol_mismatch_older_client_is_client_old() {
        let err = LoginError::ProtocolMismatch {
            client: 500,
            server: 554,
        };
        assert_eq!(err.play_status(), Some(PlayStatus::LoginFailedClientOld));
        assert_eq!(err.disconnect_message(), OUTDATED_CLIENT_DISCONNECT);
    }

    #[test]
    fn test_security_failures_share_generic_message() {
        let failures = [
            LoginError::MalformedChainData("no chain".into()),
            LoginError::ChainVerificationFailure {
                link: 1,
                reason: "InvalidSignature".into(),
            },
            LoginError::MissingIdentityField,
            LoginError::MissingClientDataField("XUID"),
            LoginError::SkinSignatureMismatch("InvalidSignature".into()),
        ];
        for err in failures {
            assert_eq!(err.disconnect_message(), GENERIC_DISCONNECT, "{err}");
            assert_eq!(err.play_status(), None);
        }
    }

    #[test]
    fn test_resource_pack_violation_message() {
        let err = LoginError::ResourcePackProtocolViolation(1);
        assert_eq!(err.disconnect_message(), RESOURCE_PACK_DISCONNECT);
        assert_eq!(err.kind(), "resource_pack_protocol_violation");
    }

    #[test]
    fn test_display_includes_internal_detail() {
        let err = LoginError::ChainVerificationFailure {
            link: 2,
            reason: "x5u mismatch".into(),
        };
        assert_eq!(err.to_string(), "chain verification failed at link 2: x5u mismatch");
    }
}
