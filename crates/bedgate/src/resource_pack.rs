//! The resource-pack exchange.
//!
//! The gateway never offers packs, so the exchange is fixed:
//!
//! ```text
//! server: ResourcePacksInfo (empty)
//! client: HAVE_ALL_PACKS  →  server: ResourcePackStack (empty)   (optional)
//! client: COMPLETED       →  begin gameplay
//! ```

use bedgate_protocol::{ClientboundPacket, ResourcePackResponse};
use bedgate_session::LoginError;

/// What to do with a client's pack response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackAction {
    /// Reply with [`empty_stack`] and keep waiting.
    SendStack,
    /// The exchange is done; start gameplay.
    BeginGameplay,
}

/// The pack listing sent right after login: no packs of either kind.
pub fn packs_info() -> ClientboundPacket {
    ClientboundPacket::ResourcePacksInfo {
        forced_to_accept: false,
        scripting_enabled: false,
        behavior_packs: Vec::new(),
        resource_packs: Vec::new(),
    }
}

/// The pack stack sent on `HAVE_ALL_PACKS`.
pub fn empty_stack() -> ClientboundPacket {
    ClientboundPacket::ResourcePackStack {
        forced_to_accept: false,
        experiments_previously_toggled: false,
        game_version: "*".to_string(),
        behavior_packs: Vec::new(),
        resource_packs: Vec::new(),
    }
}

/// Decides how to answer `status`. Anything other than `HAVE_ALL_PACKS`
/// or `COMPLETED` is a protocol violation, since there are no packs to
/// send or refuse.
pub fn respond(status: ResourcePackResponse) -> Result<PackAction, LoginError> {
    match status {
        ResourcePackResponse::HaveAllPacks => Ok(PackAction::SendStack),
        ResourcePackResponse::Completed => Ok(PackAction::BeginGameplay),
        other => Err(LoginError::ResourcePackProtocolViolation(u8::from(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_have_all_packs_sends_stack() {
        assert_eq!(
            respond(ResourcePackResponse::HaveAllPacks),
            Ok(PackAction::SendStack)
        );
    }

    #[test]
    fn test_respond_completed_begins_gameplay() {
        assert_eq!(
            respond(ResourcePackResponse::Completed),
            Ok(PackAction::BeginGameplay)
        );
    }

    #[test]
    fn test_respond_other_statuses_violate() {
        for byte in [0u8, 1, 2, 5, 255] {
            let status = ResourcePackResponse::from(byte);
            assert_eq!(
                respond(status),
                Err(LoginError::ResourcePackProtocolViolation(byte))
            );
        }
    }

    #[test]
    fn test_empty_stack_flags() {
        let ClientboundPacket::ResourcePackStack {
            forced_to_accept,
            experiments_previously_toggled,
            game_version,
            behavior_packs,
            resource_packs,
        } = empty_stack()
        else {
            panic!("not a stack");
        };
        assert!(!forced_to_accept);
        assert!(!experiments_previously_toggled);
        assert_eq!(game_version, "*");
        assert!(behavior_packs.is_empty() && resource_packs.is_empty());
    }
}
