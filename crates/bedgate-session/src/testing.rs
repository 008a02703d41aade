//! Signed test chains and client-data tokens.
//!
//! Available to this crate's tests and, through the `test-util` feature,
//! to other crates' tests. The keys are fixed P-384 fixtures checked into
//! `fixtures/`; they must never be trusted outside tests.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

/// A fixture key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestKey {
    private_pem: &'static str,
    public_b64: &'static str,
}

impl TestKey {
    /// Base64 DER public key, as it appears in `x5u` and
    /// `identityPublicKey`.
    pub fn public(&self) -> &'static str {
        self.public_b64.trim()
    }

    /// Key for signing tokens.
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_ec_pem(self.private_pem.as_bytes()).expect("fixture key is PKCS#8 P-384")
    }
}

macro_rules! fixture {
    ($name:literal) => {
        TestKey {
            private_pem: include_str!(concat!("../fixtures/", $name, ".pem")),
            public_b64: include_str!(concat!("../fixtures/", $name, ".pub")),
        }
    };
}

/// Plays the trusted root.
pub const ROOT: TestKey = fixture!("root");
/// Signed by the root.
pub const INTERMEDIATE: TestKey = fixture!("intermediate");
/// Issues identity links.
pub const ISSUER: TestKey = fixture!("issuer");
/// The player's own key.
pub const IDENTITY: TestKey = fixture!("identity");
/// Trusted by nobody.
pub const STRANGER: TestKey = fixture!("stranger");

/// UUID of the sample player.
pub const STEVE_UUID: &str = "5d1b1e54-6c9e-4b5a-9d0c-2f2f1c4e8a11";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after 1970")
        .as_secs()
}

/// Signs `claims` as an ES384 token whose `x5u` names `signer`.
pub fn sign_token(signer: &TestKey, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::ES384);
    header.x5u = Some(signer.public().to_owned());
    encode(&header, claims, &signer.encoding_key()).expect("ES384 signing")
}

/// Claims for a link that vouches for `next`, valid for an hour.
pub fn link_claims(next: TestKey) -> Value {
    let now = now();
    json!({
        "identityPublicKey": next.public(),
        "certificateAuthority": true,
        "iat": now,
        "nbf": now - 60,
        "exp": now + 3600,
    })
}

/// An `extraData` object.
pub fn identity_extra(display_name: &str, identity: &str, xuid: &str) -> Value {
    json!({
        "displayName": display_name,
        "identity": identity,
        "XUID": xuid,
        "titleId": "896928775",
    })
}

/// `extraData` for Steve, XUID `123`.
pub fn steve() -> Value {
    identity_extra("Steve", STEVE_UUID, "123")
}

/// Builds identity chains one link at a time.
#[derive(Debug, Clone, Default)]
pub struct ChainBuilder {
    tokens: Vec<String>,
}

impl ChainBuilder {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a link signed by `signer` that vouches for `next`.
    pub fn link(self, signer: TestKey, next: TestKey) -> Self {
        self.link_with(signer, link_claims(next))
    }

    /// Appends a final link naming `identity` and carrying `extra` as
    /// `extraData`.
    pub fn identity(self, signer: TestKey, identity: TestKey, extra: Value) -> Self {
        let mut claims = link_claims(identity);
        claims["extraData"] = extra;
        self.link_with(signer, claims)
    }

    /// Appends a link with arbitrary claims.
    pub fn link_with(mut self, signer: TestKey, claims: Value) -> Self {
        self.tokens.push(sign_token(&signer, &claims));
        self
    }

    /// The signed tokens.
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.clone()
    }

    /// The `{"chain": [...]}` document a `Login` packet carries.
    pub fn chain_data(&self) -> Vec<u8> {
        chain_data(&self.tokens)
    }
}

/// Wraps tokens in a `{"chain": [...]}` document.
pub fn chain_data(tokens: &[String]) -> Vec<u8> {
    serde_json::to_vec(&json!({ "chain": tokens })).expect("chain document")
}

/// Three links rooted directly in [`ROOT`], ending in Steve's identity.
pub fn strict_chain() -> ChainBuilder {
    ChainBuilder::new()
        .link(ROOT, INTERMEDIATE)
        .link(INTERMEDIATE, ISSUER)
        .identity(ISSUER, IDENTITY, steve())
}

/// The shape of an online chain: a self-signed first link vouching for
/// [`ROOT`], then root, intermediate, and Steve's identity.
pub fn anchored_chain() -> ChainBuilder {
    ChainBuilder::new()
        .link(IDENTITY, ROOT)
        .link(ROOT, INTERMEDIATE)
        .identity(INTERMEDIATE, IDENTITY, steve())
}

/// Signs a client-data token.
pub fn client_data_token(signer: &TestKey, claims: &Value) -> String {
    sign_token(signer, claims)
}

/// Client-data claims like a phone client sends, trimmed of skin images.
pub fn sample_client_claims() -> Value {
    json!({
        "GameVersion": "1.19.30",
        "DeviceOS": 7,
        "DeviceModel": "Pixel 7",
        "DeviceId": "0a1b2c3d",
        "LanguageCode": "en_US",
        "ServerAddress": "play.example.net:19132",
        "SkinId": "c18e65aa-7b21-4637-9b63-8ad63622ef01.Custom",
        "ThirdPartyName": "Steve",
        "CurrentInputMode": 2,
        "DefaultInputMode": 2,
        "GuiScale": -1,
        "UIProfile": 0,
        "ClientRandomId": 4_294_967_297_i64,
        "PlatformOnlineId": "",
        "SelfSignedId": "9a2a1a44-3f31-4a6f-8c3b-0b5b6d8d2e77",
        "PlayFabId": "5eb65f73af7e4c1c",
        "SkinImageWidth": 64,
        "SkinImageHeight": 64,
        "ArmSize": "wide",
        "PremiumSkin": false,
    })
}
