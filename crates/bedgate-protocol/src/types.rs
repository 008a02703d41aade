//! Login-phase packet types.
//!
//! Only the packets the gateway exchanges before handing a player off are
//! modelled. Inbound and outbound packets are separate closed enums, so a
//! handler matching on [`ServerboundPacket`] is checked for completeness
//! at compile time.

use serde::{Deserialize, Serialize};

use bedgate_transport::CompressionAlgorithm;

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Status carried by a `PlayStatus` packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayStatus {
    /// The login was accepted.
    LoginSuccess,
    /// The client speaks an older protocol than the server.
    LoginFailedClientOld,
    /// The client speaks a newer protocol than the server.
    LoginFailedServerOld,
    /// The player may spawn into the world.
    PlayerSpawn,
}

/// A client's answer to the resource-pack offer.
///
/// Encoded as the client's raw status byte. Values the gateway does not
/// know are kept as [`Other`](Self::Other) so they can be rejected by the
/// handshake rather than failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ResourcePackResponse {
    /// The client refused the offered packs.
    Refused,
    /// The client wants pack contents sent to it.
    SendPacks,
    /// The client has every pack and asks for the stack.
    HaveAllPacks,
    /// The resource-pack exchange is finished.
    Completed,
    /// Any other status byte.
    Other(u8),
}

impl From<u8> for ResourcePackResponse {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Refused,
            2 => Self::SendPacks,
            3 => Self::HaveAllPacks,
            4 => Self::Completed,
            other => Self::Other(other),
        }
    }
}

impl From<ResourcePackResponse> for u8 {
    fn from(value: ResourcePackResponse) -> Self {
        match value {
            ResourcePackResponse::Refused => 1,
            ResourcePackResponse::SendPacks => 2,
            ResourcePackResponse::HaveAllPacks => 3,
            ResourcePackResponse::Completed => 4,
            ResourcePackResponse::Other(other) => other,
        }
    }
}

/// One entry in a resource-pack listing or stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEntry {
    /// Pack UUID.
    pub id: String,
    /// Pack version string.
    pub version: String,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Packets a client sends during login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerboundPacket {
    /// Asks the server which compression to use.
    RequestNetworkSettings {
        /// The client's protocol version.
        protocol_version: u32,
    },

    /// Presents the client's identity.
    Login {
        /// The client's protocol version.
        protocol_version: u32,
        /// JSON document holding the signed identity chain.
        chain_data: Vec<u8>,
        /// Compact JWS carrying skin and device data.
        skin_data: String,
    },

    /// Answers the resource-pack offer.
    ResourcePackClientResponse {
        /// The client's answer.
        status: ResourcePackResponse,
        /// Packs the client asks for, if any.
        #[serde(default)]
        pack_ids: Vec<String>,
    },

    /// The client has finished loading and its player is in the world.
    SetLocalPlayerAsInitialized {
        /// Runtime id of the local player entity.
        runtime_entity_id: u64,
    },
}

impl ServerboundPacket {
    /// The packet's name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestNetworkSettings { .. } => "RequestNetworkSettings",
            Self::Login { .. } => "Login",
            Self::ResourcePackClientResponse { .. } => "ResourcePackClientResponse",
            Self::SetLocalPlayerAsInitialized { .. } => "SetLocalPlayerAsInitialized",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Packets the gateway sends during login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientboundPacket {
    /// Tells the client which compression every later frame uses.
    NetworkSettings {
        /// Payloads at or above this size are compressed.
        compression_threshold: u16,
        /// The algorithm to use.
        compression_algorithm: CompressionAlgorithm,
    },

    /// Reports login progress or failure.
    PlayStatus {
        /// The status being reported.
        status: PlayStatus,
    },

    /// Lists the packs the server offers.
    ResourcePacksInfo {
        /// Whether the client must accept the packs to join.
        forced_to_accept: bool,
        /// Whether the packs contain scripts.
        scripting_enabled: bool,
        /// Offered behaviour packs.
        behavior_packs: Vec<PackEntry>,
        /// Offered resource packs.
        resource_packs: Vec<PackEntry>,
    },

    /// The order in which packs are applied.
    ResourcePackStack {
        /// Whether the client must accept the packs to join.
        forced_to_accept: bool,
        /// Whether experiments were ever toggled on the world.
        experiments_previously_toggled: bool,
        /// Game version the stack targets; `*` for any.
        game_version: String,
        /// Behaviour packs, bottom first.
        behavior_packs: Vec<PackEntry>,
        /// Resource packs, bottom first.
        resource_packs: Vec<PackEntry>,
    },

    /// Ends the connection, showing `message` to the player.
    Disconnect {
        /// A localization key or literal text.
        message: String,
        /// Skip the disconnect screen entirely.
        hide_disconnect_screen: bool,
    },

    /// Moves the client to another server.
    Transfer {
        /// Host name or IP of the destination.
        address: String,
        /// Port of the destination.
        port: u16,
    },
}

impl ClientboundPacket {
    /// A `PlayStatus` packet.
    pub fn play_status(status: PlayStatus) -> Self {
        Self::PlayStatus { status }
    }

    /// A `Disconnect` packet that shows `message`.
    pub fn disconnect(message: impl Into<String>) -> Self {
        Self::Disconnect {
            message: message.into(),
            hide_disconnect_screen: false,
        }
    }

    /// The packet's name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NetworkSettings { .. } => "NetworkSettings",
            Self::PlayStatus { .. } => "PlayStatus",
            Self::ResourcePacksInfo { .. } => "ResourcePacksInfo",
            Self::ResourcePackStack { .. } => "ResourcePackStack",
            Self::Disconnect { .. } => "Disconnect",
            Self::Transfer { .. } => "Transfer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&PlayStatus::LoginFailedServerOld).unwrap();
        assert_eq!(json, "\"LOGIN_FAILED_SERVER_OLD\"");
    }

    #[test]
    fn test_resource_pack_response_known_bytes() {
        assert_eq!(ResourcePackResponse::from(3), ResourcePackResponse::HaveAllPacks);
        assert_eq!(ResourcePackResponse::from(4), ResourcePackResponse::Completed);
        assert_eq!(u8::from(ResourcePackResponse::SendPacks), 2);
    }

    #[test]
    fn test_resource_pack_response_unknown_byte_is_kept() {
        let status: ResourcePackResponse = serde_json::from_str("77").unwrap();
        assert_eq!(status, ResourcePackResponse::Other(77));
        assert_eq!(serde_json::to_string(&status).unwrap(), "77");
    }

    #[test]
    fn test_serverbound_login_json_format() {
        let json = r#"{
            "type": "Login",
            "protocol_version": 554,
            "chain_data": [123, 125],
            "skin_data": "a.b.c"
        }"#;
        let packet: ServerboundPacket = serde_json::from_str(json).unwrap();
        assert_eq!(
            packet,
            ServerboundPacket::Login {
                protocol_version: 554,
                chain_data: b"{}".to_vec(),
                skin_data: "a.b.c".into(),
            }
        );
        assert_eq!(packet.name(), "Login");
    }

    #[test]
    fn test_serverbound_pack_ids_default_to_empty() {
        let json = r#"{"type": "ResourcePackClientResponse", "status": 4}"#;
        let packet: ServerboundPacket = serde_json::from_str(json).unwrap();
        assert_eq!(
            packet,
            ServerboundPacket::ResourcePackClientResponse {
                status: ResourcePackResponse::Completed,
                pack_ids: vec![],
            }
        );
    }

    #[test]
    fn test_serverbound_unknown_type_is_rejected() {
        let json = r#"{"type": "MovePlayer", "x": 1}"#;
        assert!(serde_json::from_str::<ServerboundPacket>(json).is_err());
    }

    #[test]
    fn test_network_settings_json_format() {
        let packet = ClientboundPacket::NetworkSettings {
            compression_threshold: 512,
            compression_algorithm: CompressionAlgorithm::Zlib,
        };
        let json = serde_json::to_value(&packet).unwrap();
        assert_eq!(json["type"], "NetworkSettings");
        assert_eq!(json["compression_threshold"], 512);
        assert_eq!(json["compression_algorithm"], "ZLIB");
    }

    #[test]
    fn test_disconnect_constructor_shows_screen() {
        let packet = ClientboundPacket::disconnect("disconnectionScreen.resourcePack");
        assert_eq!(
            packet,
            ClientboundPacket::Disconnect {
                message: "disconnectionScreen.resourcePack".into(),
                hide_disconnect_screen: false,
            }
        );
        assert_eq!(packet.name(), "Disconnect");
    }
}
