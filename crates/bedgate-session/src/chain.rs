//! Identity chain parsing and chain-of-trust verification.
//!
//! A client proves who it is with a list of ES384-signed tokens:
//!
//! ```text
//! link 0  x5u = K0   payload.identityPublicKey = K1
//! link 1  x5u = K1   payload.identityPublicKey = K2
//! link 2  x5u = K2   payload.identityPublicKey = identity key, extraData
//! ```
//!
//! Each link is verified with the key named in its `x5u` header, and that
//! key must be the one the previous link vouched for. Where the chain has
//! to start is decided by the [`TrustPolicy`].

use jsonwebtoken::{DecodingKey, decode, decode_header};
use serde_json::Value;

use crate::{LoginError, RootMode, TrustPolicy};

// ---------------------------------------------------------------------------
// IdentityChain
// ---------------------------------------------------------------------------

/// The ordered, non-empty list of signed tokens from a `Login` packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChain {
    links: Vec<String>,
}

impl IdentityChain {
    /// Parses the `{"chain": [...]}` document a client sends.
    ///
    /// No signature is looked at here, so an empty or malformed chain is
    /// rejected before any cryptographic work is done.
    pub fn parse(raw: &[u8]) -> Result<Self, LoginError> {
        let document: Value = serde_json::from_slice(raw)
            .map_err(|e| LoginError::MalformedChainData(format!("not JSON: {e}")))?;
        let chain = document
            .get("chain")
            .ok_or_else(|| LoginError::MalformedChainData("no `chain` field".into()))?
            .as_array()
            .ok_or_else(|| LoginError::MalformedChainData("`chain` is not a list".into()))?;

        let links = chain
            .iter()
            .enumerate()
            .map(|(i, link)| {
                link.as_str().map(str::to_owned).ok_or_else(|| {
                    LoginError::MalformedChainData(format!("link {i} is not a string"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_links(links)
    }

    /// Builds a chain from already-split tokens.
    pub fn from_links(links: Vec<String>) -> Result<Self, LoginError> {
        if links.is_empty() {
            return Err(LoginError::MalformedChainData("`chain` is empty".into()));
        }
        Ok(Self { links })
    }

    /// The signed tokens, outermost first.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Number of links. Never zero.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Turns a base64 DER `SubjectPublicKeyInfo` into a verification key.
pub(crate) fn decoding_key(spki_b64: &str) -> Result<DecodingKey, String> {
    let spki_b64 = spki_b64.trim();
    let is_base64 = !spki_b64.is_empty()
        && spki_b64
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='));
    if !is_base64 {
        return Err("public key is not base64".into());
    }

    let mut pem = String::with_capacity(spki_b64.len() + 64);
    pem.push_str("-----BEGIN PUBLIC KEY-----\n");
    for (i, c) in spki_b64.chars().enumerate() {
        if i > 0 && i % 64 == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str("\n-----END PUBLIC KEY-----\n");

    DecodingKey::from_ec_pem(pem.as_bytes()).map_err(|e| format!("bad public key: {e}"))
}

// ---------------------------------------------------------------------------
// ChainVerifier
// ---------------------------------------------------------------------------

/// The result of a chain that verified end to end.
#[derive(Debug, Clone)]
pub struct VerifiedChain {
    /// The chain exactly as received.
    pub chain: IdentityChain,
    /// Key the client-data token must be signed with.
    pub identity_public_key: String,
    /// Claims of the final link, holding `extraData`.
    pub payload: Value,
}

/// Verifies identity chains against a [`TrustPolicy`].
#[derive(Debug, Clone)]
pub struct ChainVerifier {
    policy: TrustPolicy,
}

impl ChainVerifier {
    /// Creates a verifier that enforces `policy`.
    pub fn new(policy: TrustPolicy) -> Self {
        Self { policy }
    }

    /// The policy chains are checked against.
    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Parses and verifies the raw chain document from a `Login` packet.
    pub fn verify(&self, raw: &[u8]) -> Result<VerifiedChain, LoginError> {
        self.verify_chain(IdentityChain::parse(raw)?)
    }

    /// Verifies every link of an already parsed chain.
    ///
    /// Fails on the first bad link; nothing from a partially verified
    /// chain is returned.
    pub fn verify_chain(&self, chain: IdentityChain) -> Result<VerifiedChain, LoginError> {
        let validation = self.policy.validation();
        let mut expected_signer: Option<String> = None;
        let mut anchored = self.policy.mode != RootMode::Anchored;
        let mut payload = Value::Null;

        for (link, token) in chain.links().iter().enumerate() {
            let fail = |reason: String| LoginError::ChainVerificationFailure { link, reason };

            let header = decode_header(token).map_err(|e| fail(format!("bad header: {e}")))?;
            let signer = header.x5u.ok_or_else(|| fail("no x5u header".into()))?;

            match &expected_signer {
                Some(expected) if *expected != signer => {
                    return Err(fail(
                        "signer is not the previous link's identityPublicKey".into(),
                    ));
                }
                None if self.policy.mode == RootMode::Strict
                    && !self.policy.is_trusted_root(&signer) =>
                {
                    return Err(fail("not signed by a trusted root".into()));
                }
                _ => {}
            }

            let key = decoding_key(&signer).map_err(fail)?;
            let data = decode::<Value>(token, &key, &validation)
                .map_err(|e| fail(e.to_string()))?;

            if self.policy.is_trusted_root(&signer) {
                anchored = true;
            }

            expected_signer = data
                .claims
                .get("identityPublicKey")
                .and_then(Value::as_str)
                .map(str::to_owned);
            if expected_signer.is_none() && link + 1 < chain.len() {
                return Err(fail("no identityPublicKey for the next link".into()));
            }
            payload = data.claims;
        }

        if !anchored {
            return Err(LoginError::ChainVerificationFailure {
                link: chain.len() - 1,
                reason: "chain never reached a trusted root".into(),
            });
        }

        let identity_public_key = expected_signer.ok_or(LoginError::MissingIdentityField)?;
        tracing::trace!(links = chain.len(), mode = %self.policy.mode, "identity chain verified");

        Ok(VerifiedChain {
            chain,
            identity_public_key,
            payload,
        })
    }
}
