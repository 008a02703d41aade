//! Unified error type for the bedgate gateway.

use bedgate_protocol::ProtocolError;
use bedgate_session::LoginError;
use bedgate_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// Handshake steps return this so `?` works on every layer.
/// [`Login`](Self::Login) is consumed by the login state machine, which
/// turns it into a disconnect; the other variants end the connection
/// task.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A packet could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A client failed to log in.
    #[error(transparent)]
    Login(#[from] LoginError),
}
