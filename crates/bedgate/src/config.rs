//! Gateway configuration.
//!
//! Every setting has a default, and each can be overridden from the
//! environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `BEDGATE_BIND` | listen address | `0.0.0.0:19132` |
//! | `BEDGATE_MOTD` | message of the day of the target | `bedgate` |
//! | `BEDGATE_MAX_PLAYERS` | player limit of the target | `100` |
//! | `BEDGATE_TARGET_ADDRESS` | host players are handed off to | `127.0.0.1` |
//! | `BEDGATE_TARGET_PORT` | port players are handed off to | `19133` |
//! | `BEDGATE_TRUST_MODE` | `strict`, `anchored` or `self-signed` | `anchored` |
//! | `BEDGATE_TRUSTED_ROOTS` | comma-separated base64 DER root keys | Xbox Live roots |
//! | `BEDGATE_SKIP_EXPIRY` | `true`/`1` to ignore `exp`/`nbf` | `false` |
//! | `BEDGATE_LOGIN_TIMEOUT_SECS` | time from connect to finished login | `10` |
//! | `BEDGATE_IDLE_TIMEOUT_SECS` | wait for each packet after login | `30` |

use std::str::FromStr;
use std::time::Duration;

use bedgate_session::{MOJANG_ROOT_KEYS, RootMode, TrustPolicy, UnknownRootMode};

use crate::ServerInfo;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        /// Name of the variable.
        var: &'static str,
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The trust mode is not recognised.
    #[error(transparent)]
    TrustMode(#[from] UnknownRootMode),

    /// A mode that needs root keys was given none.
    #[error("trust mode requires at least one trusted root key")]
    NoTrustedRoots,
}

/// Settings for a gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on.
    pub bind: String,
    /// Message of the day of the handoff target.
    pub motd: String,
    /// Player limit of the handoff target.
    pub max_players: u32,
    /// Host players are transferred to.
    pub target_address: String,
    /// Port players are transferred to.
    pub target_port: u16,
    /// Which identity chains are trusted.
    pub trust: TrustPolicy,
    /// Deadline from connect until login succeeds. Also bounds the
    /// WebSocket upgrade.
    pub login_timeout: Duration,
    /// How long to wait for each packet afterwards.
    pub idle_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:19132".to_string(),
            motd: "bedgate".to_string(),
            max_players: 100,
            target_address: "127.0.0.1".to_string(),
            target_port: 19133,
            trust: TrustPolicy::mojang(),
            login_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Reads the configuration from `BEDGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mode = match lookup("BEDGATE_TRUST_MODE") {
            Some(value) => value.parse::<RootMode>()?,
            None => defaults.trust.mode,
        };
        let roots: Vec<String> = match lookup("BEDGATE_TRUSTED_ROOTS") {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned)
                .collect(),
            None => MOJANG_ROOT_KEYS.iter().map(|key| key.to_string()).collect(),
        };
        if roots.is_empty() && mode != RootMode::SelfSigned {
            return Err(ConfigError::NoTrustedRoots);
        }
        let skip_expiry = lookup("BEDGATE_SKIP_EXPIRY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            bind: lookup("BEDGATE_BIND").unwrap_or(defaults.bind),
            motd: lookup("BEDGATE_MOTD").unwrap_or(defaults.motd),
            max_players: parse(&lookup, "BEDGATE_MAX_PLAYERS")?.unwrap_or(defaults.max_players),
            target_address: lookup("BEDGATE_TARGET_ADDRESS").unwrap_or(defaults.target_address),
            target_port: parse(&lookup, "BEDGATE_TARGET_PORT")?.unwrap_or(defaults.target_port),
            trust: TrustPolicy::with_mode(mode, roots).validate_expiry(!skip_expiry),
            login_timeout: parse(&lookup, "BEDGATE_LOGIN_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.login_timeout),
            idle_timeout: parse(&lookup, "BEDGATE_IDLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
        })
    }

    /// The handoff target described by this configuration.
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            motd: self.motd.clone(),
            max_players: self.max_players,
            address: self.target_address.clone(),
            port: self.target_port,
        }
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}
