//! Which keys an identity chain may be rooted in.
//!
//! Keys are compared as the base64 DER `SubjectPublicKeyInfo` strings that
//! appear in `x5u` headers and `identityPublicKey` claims.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, Validation};

/// Root keys published for Xbox Live authenticated chains. The first was
/// used until 2024; the second replaced it.
pub const MOJANG_ROOT_KEYS: [&str; 2] = [
    "MHYwEAYHKoZIzj0CAQYFK4EEACIDYgAE8ELkixyLcwlZryUQcu1TvPOmI2B7vX83ndnWRUaXm74wFfa5f/lwQNTfrLVHa2PmenpGI6JhIMUJaWZrjmMj90NoKNFSNBuKdm8rYiXsfaz3K36x/1U26HpG0ZxK/V1V",
    "MHYwEAYHKoZIzj0CAQYFK4EEACIDYgAECRXueJeTDqNRRgJi/vlRufByu/2G0i2Ebt6YMar5QX/R0DIIyrJMcUpruK4QveTfJSTp3Shlq4Gk34cD/4GUWwkv0DVuzeuB+tXija7HBxii03NHDbPAD0AKnLr2wdAp",
];

/// How the first link of a chain is trusted.
///
/// ```text
/// Strict      link 0 ── signed by ──▶ trusted root
/// Anchored    link 0 self-signed, some later link signed by a trusted root
/// SelfSigned  link 0 self-signed, no root required (offline clients)
/// ```
///
/// In every mode each link after the first must be signed by the key the
/// previous link names in `identityPublicKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootMode {
    /// Link 0 must be signed by a trusted root.
    Strict,
    /// The chain must pass through a trusted root somewhere.
    Anchored,
    /// Any self-signed chain is accepted.
    SelfSigned,
}

impl fmt::Display for RootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Anchored => "anchored",
            Self::SelfSigned => "self-signed",
        })
    }
}

/// Returned when parsing an unknown [`RootMode`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trust mode `{0}` (expected strict, anchored, or self-signed)")]
pub struct UnknownRootMode(pub String);

impl FromStr for RootMode {
    type Err = UnknownRootMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "anchored" => Ok(Self::Anchored),
            "self-signed" | "self_signed" | "offline" => Ok(Self::SelfSigned),
            _ => Err(UnknownRootMode(s.to_string())),
        }
    }
}

/// The trust configuration every chain is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    /// How link 0 is trusted.
    pub mode: RootMode,
    /// Trusted root keys.
    pub roots: HashSet<String>,
    /// Enforce `exp` and `nbf` claims (with 60 seconds of leeway).
    pub validate_expiry: bool,
}

impl TrustPolicy {
    /// Link 0 must be signed by one of `roots`.
    pub fn strict<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(RootMode::Strict, roots)
    }

    /// Some link must be signed by one of `roots`.
    pub fn anchored<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(RootMode::Anchored, roots)
    }

    /// Accepts any self-signed chain. Only for offline servers.
    pub fn self_signed() -> Self {
        Self::with_mode(RootMode::SelfSigned, std::iter::empty::<String>())
    }

    /// Anchored in the published Xbox Live root keys.
    pub fn mojang() -> Self {
        Self::anchored(MOJANG_ROOT_KEYS)
    }

    /// A policy with the given mode and roots.
    pub fn with_mode<I, S>(mode: RootMode, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            roots: roots.into_iter().map(Into::into).collect(),
            validate_expiry: true,
        }
    }

    /// Turns `exp`/`nbf` enforcement on or off.
    pub fn validate_expiry(mut self, validate: bool) -> Self {
        self.validate_expiry = validate;
        self
    }

    /// Whether `key` is one of the trusted roots.
    pub fn is_trusted_root(&self, key: &str) -> bool {
        self.roots.contains(key)
    }

    /// JWS validation rules shared by chain links and the client-data
    /// token.
    pub(crate) fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::ES384);
        // Client-data tokens carry no registered claims at all.
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.validate_exp = self.validate_expiry;
        validation.validate_nbf = self.validate_expiry;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_mode_parses_known_names() {
        assert_eq!("strict".parse::<RootMode>().unwrap(), RootMode::Strict);
        assert_eq!(" Anchored ".parse::<RootMode>().unwrap(), RootMode::Anchored);
        assert_eq!("offline".parse::<RootMode>().unwrap(), RootMode::SelfSigned);
        assert_eq!(RootMode::SelfSigned.to_string(), "self-signed");
    }

    #[test]
    fn test_root_mode_rejects_unknown_name() {
        let err = "trusting".parse::<RootMode>().unwrap_err();
        assert_eq!(err, UnknownRootMode("trusting".into()));
    }

    #[test]
    fn test_mojang_policy_is_anchored_with_both_roots() {
        let policy = TrustPolicy::mojang();
        assert_eq!(policy.mode, RootMode::Anchored);
        assert!(MOJANG_ROOT_KEYS.iter().all(|k| policy.is_trusted_root(k)));
        assert!(policy.validate_expiry);
    }

    #[test]
    fn test_self_signed_policy_trusts_no_roots() {
        let policy = TrustPolicy::self_signed();
        assert!(policy.roots.is_empty());
        assert!(!policy.is_trusted_root(MOJANG_ROOT_KEYS[0]));
    }

    #[test]
    fn test_validation_follows_expiry_flag() {
        let policy = TrustPolicy::strict(["k"]).validate_expiry(false);
        let validation = policy.validation();
        assert!(!validation.validate_exp);
        assert!(!validation.validate_nbf);
        assert!(validation.required_spec_claims.is_empty());
    }
}
