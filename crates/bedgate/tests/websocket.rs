//! End-to-end login over a real WebSocket listener, including the
//! compressed framing that follows `NetworkSettings`.

use std::time::Duration;

use bedgate::prelude::*;
use bedgate_protocol::DEFAULT_PROTOCOL_VERSION;
use bedgate_session::testing::{
    IDENTITY, ROOT, client_data_token, sample_client_claims, strict_chain,
};
use bedgate_transport::Compression;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect() -> ClientWs {
    let config = GatewayConfig {
        bind: "127.0.0.1:0".into(),
        trust: TrustPolicy::strict([ROOT.public()]),
        ..GatewayConfig::default()
    };
    let gateway = GatewayBuilder::new(config).build().await.expect("should bind");
    let addr = gateway.local_addr().expect("local addr");
    tokio::spawn(gateway.run());

    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    client
}

async fn next_frame(client: &mut ClientWs) -> Vec<u8> {
    let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out")
        .expect("stream ended")
        .expect("ws error");
    msg.into_data().to_vec()
}

fn encode(packet: &ServerboundPacket) -> Message {
    Message::Binary(serde_json::to_vec(packet).unwrap().into())
}

#[tokio::test]
async fn test_websocket_login_switches_to_compressed_frames() {
    let mut client = connect().await;
    let zlib = Compression::zlib();

    client
        .send(encode(&ServerboundPacket::RequestNetworkSettings {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
        }))
        .await
        .unwrap();

    // NetworkSettings arrives as plain JSON, no header byte.
    let settings: Value = serde_json::from_slice(&next_frame(&mut client).await).unwrap();
    assert_eq!(settings["type"], "NetworkSettings");
    assert_eq!(settings["compression_threshold"], 512);

    // From here on both directions are framed.
    let login = serde_json::to_vec(&ServerboundPacket::Login {
        protocol_version: DEFAULT_PROTOCOL_VERSION,
        chain_data: strict_chain().chain_data(),
        skin_data: client_data_token(&IDENTITY, &sample_client_claims()),
    })
    .unwrap();
    assert!(login.len() > 512, "login should be large enough to deflate");
    client
        .send(Message::Binary(zlib.compress(&login).unwrap().into()))
        .await
        .unwrap();

    let frame = next_frame(&mut client).await;
    assert_eq!(frame[0], 0xFF, "short packets are framed raw");
    let status: Value = serde_json::from_slice(&zlib.decompress(&frame).unwrap()).unwrap();
    assert_eq!(status["status"], "LOGIN_SUCCESS");

    let info: Value =
        serde_json::from_slice(&zlib.decompress(&next_frame(&mut client).await).unwrap())
            .unwrap();
    assert_eq!(info["type"], "ResourcePacksInfo");
}

#[tokio::test]
async fn test_websocket_bad_chain_gets_single_disconnect() {
    let mut client = connect().await;

    client
        .send(encode(&ServerboundPacket::Login {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            chain_data: br#"{"chain": []}"#.to_vec(),
            skin_data: String::new(),
        }))
        .await
        .unwrap();

    let disconnect: Value = serde_json::from_slice(&next_frame(&mut client).await).unwrap();
    assert_eq!(disconnect["type"], "Disconnect");

    // The gateway closes the socket after the disconnect packet.
    let rest = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out");
    assert!(matches!(rest, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

#[tokio::test]
async fn test_websocket_stalled_client_does_not_block_others() {
    let config = GatewayConfig {
        bind: "127.0.0.1:0".into(),
        trust: TrustPolicy::strict([ROOT.public()]),
        ..GatewayConfig::default()
    };
    let gateway = GatewayBuilder::new(config).build().await.expect("should bind");
    let addr = gateway.local_addr().expect("local addr");
    tokio::spawn(gateway.run());

    // Opens TCP but never sends the WebSocket upgrade.
    let _stalled = tokio::net::TcpStream::connect(addr).await.unwrap();

    let (mut client, _) = tokio::time::timeout(
        Duration::from_secs(5),
        tokio_tungstenite::connect_async(format!("ws://{addr}")),
    )
    .await
    .expect("second client blocked by the first")
    .expect("client should connect");

    client
        .send(encode(&ServerboundPacket::RequestNetworkSettings {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
        }))
        .await
        .unwrap();
    let settings: Value = serde_json::from_slice(&next_frame(&mut client).await).unwrap();
    assert_eq!(settings["type"], "NetworkSettings");
}
