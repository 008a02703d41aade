//! The client-data token: skin and device attributes signed by the
//! player's identity key.

use jsonwebtoken::decode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::decoding_key;
use crate::{LoginError, TrustPolicy};

/// Device and skin metadata a client sends with its login.
///
/// Only the commonly used fields are named. Everything else the client
/// sends, including the skin images themselves, is kept in
/// [`extra`](Self::extra).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ClientData {
    /// Game version, e.g. `1.19.30`.
    pub game_version: String,
    /// Numeric platform id.
    #[serde(rename = "DeviceOS")]
    pub device_os: u32,
    /// Device model string.
    pub device_model: String,
    /// Per-install device id.
    pub device_id: String,
    /// Locale, e.g. `en_US`.
    pub language_code: String,
    /// Address the client typed to connect.
    pub server_address: String,
    /// Skin identifier.
    pub skin_id: String,
    /// Name shown for third-party accounts.
    pub third_party_name: String,
    /// Input mode in use.
    pub current_input_mode: u32,
    /// Input mode the device defaults to.
    pub default_input_mode: u32,
    /// GUI scale offset.
    pub gui_scale: i32,
    /// Classic or pocket UI.
    #[serde(rename = "UIProfile")]
    pub ui_profile: u32,
    /// Random id chosen by the client.
    pub client_random_id: i64,
    /// Platform account id, when the platform has one.
    pub platform_online_id: String,
    /// Self-signed id used by offline clients.
    pub self_signed_id: String,
    /// PlayFab account id.
    pub play_fab_id: String,
    /// Every other claim, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// The compact token this data was decoded from.
    #[serde(skip)]
    pub original: String,
}

/// Verifies the client-data token against the chain's identity key and
/// decodes its payload.
///
/// Any failure to check the signature, including an unparseable token,
/// is a [`LoginError::SkinSignatureMismatch`]. A payload that verified but
/// does not fit [`ClientData`] is [`LoginError::MalformedClientData`].
pub fn verify_client_data(
    token: &str,
    identity_public_key: &str,
    policy: &TrustPolicy,
) -> Result<ClientData, LoginError> {
    let key = decoding_key(identity_public_key).map_err(LoginError::SkinSignatureMismatch)?;
    let claims = decode::<Value>(token, &key, &policy.validation())
        .map_err(|e| LoginError::SkinSignatureMismatch(e.to_string()))?
        .claims;

    let mut data: ClientData = serde_json::from_value(claims)
        .map_err(|e| LoginError::MalformedClientData(e.to_string()))?;
    data.original = token.to_owned();
    Ok(data)
}
