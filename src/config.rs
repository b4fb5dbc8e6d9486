use std::env;

use chrono::Duration;

use crate::error::{Result, TwoFactorError};
use crate::secret::{DEFAULT_RECENCY_MINUTES, MASTER_KEY_LENGTH};

pub const MASTER_KEY_ENV: &str = "TWO_FACTOR_MASTER_KEY";
pub const ISSUER_ENV: &str = "TWO_FACTOR_ISSUER";
pub const RECENCY_ENV: &str = "TWO_FACTOR_RECENCY_MINUTES";

const DEFAULT_ISSUER: &str = "Cookbook";

/// Runtime configuration for the second-factor core.
#[derive(Clone)]
pub struct Config {
    /// 32-byte key protecting secrets at rest. Supplied by the deployment
    /// environment; never hard-coded, never logged.
    pub master_key: [u8; MASTER_KEY_LENGTH],
    /// Issuer label shown in authenticator apps.
    pub issuer: String,
    /// Grace period during which a verified second factor stays fresh.
    pub recency_minutes: i64,
}

impl Config {
    pub fn new(master_key: [u8; MASTER_KEY_LENGTH], issuer: impl Into<String>) -> Self {
        Config {
            master_key,
            issuer: issuer.into(),
            recency_minutes: DEFAULT_RECENCY_MINUTES,
        }
    }

    /// Loads configuration from the environment.
    ///
    /// The master key is mandatory (64 hex characters). A missing or
    /// mis-sized key is a hard error: secrets are never stored under a
    /// fallback key or in the clear.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let key_hex = env::var(MASTER_KEY_ENV)
            .map_err(|_| TwoFactorError::Configuration(format!("{} is not set", MASTER_KEY_ENV)))?;
        let key_bytes = hex::decode(key_hex.trim()).map_err(|_| {
            TwoFactorError::Configuration(format!("{} is not valid hex", MASTER_KEY_ENV))
        })?;
        let master_key: [u8; MASTER_KEY_LENGTH] = key_bytes
            .as_slice()
            .try_into()
            .map_err(|_| TwoFactorError::InvalidMasterKey(key_bytes.len()))?;

        let issuer = env::var(ISSUER_ENV).unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        let recency_minutes = env::var(RECENCY_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_RECENCY_MINUTES);

        Ok(Config {
            master_key,
            issuer,
            recency_minutes,
        })
    }

    pub fn recency_window(&self) -> Duration {
        Duration::minutes(self.recency_minutes)
    }
}

// Manual Debug so an accidental `{:?}` on application state cannot leak the
// master key into logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("master_key", &"[redacted]")
            .field("issuer", &self.issuer)
            .field("recency_minutes", &self.recency_minutes)
            .finish()
    }
}
