//! Login verification and session state for bedgate.
//!
//! This crate decides whether a client is who it claims to be:
//!
//! 1. **Chain of trust** ([`ChainVerifier`]): checks the signed identity
//!    chain against a [`TrustPolicy`] and yields the identity key
//! 2. **Identity** ([`extract_identity`]): reads display name, UUID and
//!    XUID into [`AuthData`]
//! 3. **Client data** ([`verify_client_data`]): checks the skin/device
//!    token against the identity key and decodes [`ClientData`]
//! 4. **Session state** ([`Session`]): the handshake phase, negotiated
//!    codec, and the [`Player`] once login succeeds
//!
//! Every step returns a [`LoginError`]; none of them talks to the client.
//!
//! # How it fits in the stack
//!
//! ```text
//! Gateway (above)  ← drives the handshake, turns LoginErrors into disconnects
//!     ↕
//! Session Layer (this crate)  ← verifies identity, tracks login state
//!     ↕
//! Protocol Layer (below)  ← packets and codecs
//! ```

mod chain;
mod client_data;
mod error;
mod identity;
mod session;
mod trust;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use chain::{ChainVerifier, IdentityChain, VerifiedChain};
pub use client_data::{ClientData, verify_client_data};
pub use error::{
    GENERIC_DISCONNECT, LoginError, OUTDATED_CLIENT_DISCONNECT, OUTDATED_SERVER_DISCONNECT,
    RESOURCE_PACK_DISCONNECT,
};
pub use identity::{AuthData, extract_identity};
pub use session::{HandshakePhase, Negotiation, Player, Session};
pub use trust::{MOJANG_ROOT_KEYS, RootMode, TrustPolicy, UnknownRootMode};
