//! Protocol version negotiation.

use std::sync::Arc;

use bedgate_protocol::{ClientboundPacket, Codec, CodecRegistry};
use bedgate_session::LoginError;
use bedgate_transport::{Compression, DEFAULT_COMPRESSION_THRESHOLD};

/// Picks the codec for a client's protocol version.
///
/// The registry's default codec decides how a mismatch is reported: a
/// client newer than it is told the server is outdated, anything else
/// that the client is.
pub fn negotiate(
    registry: &CodecRegistry,
    client_version: u32,
) -> Result<Arc<dyn Codec>, LoginError> {
    registry
        .lookup(client_version)
        .ok_or_else(|| LoginError::ProtocolMismatch {
            client: client_version,
            server: registry.default_codec().protocol_version(),
        })
}

/// Compression every session switches to after `NetworkSettings`.
pub fn session_compression() -> Compression {
    Compression::zlib()
}

/// The `NetworkSettings` reply announcing [`session_compression`].
pub fn network_settings() -> ClientboundPacket {
    let compression = session_compression();
    ClientboundPacket::NetworkSettings {
        compression_threshold: compression.threshold,
        compression_algorithm: compression.algorithm,
    }
}

#[cfg(test)]
mod tests {
    use bedgate_protocol::{
        CompressionAlgorithm, DEFAULT_PROTOCOL_VERSION, JsonCodec, PlayStatus,
    };

    use super::*;

    #[test]
    fn test_negotiate_exact_version_succeeds() {
        let registry = CodecRegistry::default();
        let codec = negotiate(&registry, DEFAULT_PROTOCOL_VERSION).unwrap();
        assert_eq!(codec.protocol_version(), DEFAULT_PROTOCOL_VERSION);
    }

    #[test]
    fn test_negotiate_any_other_version_fails_with_matching_status() {
        let registry = CodecRegistry::default();
        let versions = [
            0,
            390,
            DEFAULT_PROTOCOL_VERSION - 1,
            DEFAULT_PROTOCOL_VERSION + 1,
            u32::MAX,
        ];
        for version in versions {
            let err = negotiate(&registry, version).unwrap_err();
            let expected = if version > DEFAULT_PROTOCOL_VERSION {
                PlayStatus::LoginFailedServerOld
            } else {
                PlayStatus::LoginFailedClientOld
            };
            assert_eq!(err.play_status(), Some(expected), "version {version}");
        }
    }

    #[test]
    fn test_negotiate_picks_among_several_codecs() {
        let registry = CodecRegistry::default().with(Arc::new(JsonCodec::new(527, "1.19.0")));
        assert_eq!(negotiate(&registry, 527).unwrap().protocol_version(), 527);
        let err = negotiate(&registry, 540).unwrap_err();
        assert_eq!(
            err,
            LoginError::ProtocolMismatch {
                client: 540,
                server: DEFAULT_PROTOCOL_VERSION,
            }
        );
    }

    #[test]
    fn test_network_settings_is_zlib_512() {
        assert_eq!(
            network_settings(),
            ClientboundPacket::NetworkSettings {
                compression_threshold: 512,
                compression_algorithm: CompressionAlgorithm::Zlib,
            }
        );
        assert_eq!(session_compression().threshold, DEFAULT_COMPRESSION_THRESHOLD);
    }
}
