//! The authenticated identity carried in a verified chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::LoginError;

/// Who a player is, as vouched for by the identity chain.
///
/// Built once per session from the final link's `extraData` and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthData {
    /// Gamertag shown to other players.
    pub display_name: String,
    /// Account UUID.
    pub identity: Uuid,
    /// Xbox user id. Empty for offline chains.
    pub xuid: String,
}

/// Reads [`AuthData`] out of the final chain link's claims.
pub fn extract_identity(payload: &Value) -> Result<AuthData, LoginError> {
    let extra = payload
        .get("extraData")
        .and_then(Value::as_object)
        .ok_or(LoginError::MissingClientDataField("extraData"))?;

    let field = |name: &'static str| {
        extra
            .get(name)
            .and_then(Value::as_str)
            .ok_or(LoginError::MissingClientDataField(name))
    };

    let display_name = field("displayName")?.to_owned();
    let identity = parse_uuid(field("identity")?)
        .ok_or(LoginError::MissingClientDataField("identity"))?;
    let xuid = field("XUID")?.to_owned();

    Ok(AuthData {
        display_name,
        identity,
        xuid,
    })
}

/// Only the hyphenated 36-character form is accepted.
fn parse_uuid(s: &str) -> Option<Uuid> {
    if s.len() != 36 {
        return None;
    }
    Uuid::parse_str(s).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const UUID: &str = "5d1b1e54-6c9e-4b5a-9d0c-2f2f1c4e8a11";

    fn payload(extra: Value) -> Value {
        json!({ "identityPublicKey": "key", "extraData": extra })
    }

    #[test]
    fn test_extract_identity_reads_all_fields() {
        let auth = extract_identity(&payload(json!({
            "displayName": "Steve",
            "identity": UUID,
            "XUID": "123",
            "titleId": "896928775",
        })))
        .unwrap();
        assert_eq!(
            auth,
            AuthData {
                display_name: "Steve".into(),
                identity: Uuid::parse_str(UUID).unwrap(),
                xuid: "123".into(),
            }
        );
    }

    #[test]
    fn test_extract_identity_missing_extra_data() {
        let err = extract_identity(&json!({ "identityPublicKey": "key" })).unwrap_err();
        assert_eq!(err, LoginError::MissingClientDataField("extraData"));
    }

    #[test]
    fn test_extract_identity_extra_data_wrong_type() {
        let err = extract_identity(&payload(json!(["Steve"]))).unwrap_err();
        assert_eq!(err, LoginError::MissingClientDataField("extraData"));
    }

    #[test]
    fn test_extract_identity_missing_xuid() {
        let err =
            extract_identity(&payload(json!({ "displayName": "Steve", "identity": UUID })))
                .unwrap_err();
        assert_eq!(err, LoginError::MissingClientDataField("XUID"));
    }

    #[test]
    fn test_extract_identity_non_string_display_name() {
        let err = extract_identity(&payload(json!({
            "displayName": 42,
            "identity": UUID,
            "XUID": "123",
        })))
        .unwrap_err();
        assert_eq!(err, LoginError::MissingClientDataField("displayName"));
    }

    #[test]
    fn test_extract_identity_rejects_loose_uuid_forms() {
        let loose = [
            "not-a-uuid",
            "5d1b1e546c9e4b5a9d0c2f2f1c4e8a11",
            "{5d1b1e54-6c9e-4b5a-9d0c-2f2f1c4e8a11}",
        ];
        for identity in loose {
            let err = extract_identity(&payload(json!({
                "displayName": "Steve",
                "identity": identity,
                "XUID": "123",
            })))
            .unwrap_err();
            assert_eq!(err, LoginError::MissingClientDataField("identity"), "{identity}");
        }
    }
}
