//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result, bail};

/// Default nonce lifetime: one day, split into two twelve-hour ticks.
pub const DEFAULT_NONCE_LIFETIME_SECS: i64 = 86_400;

/// Runtime configuration for the admin host.
#[derive(Debug, Clone)]
pub struct Config {
    /// HMAC key for nonce generation (hex-encoded in `NONCE_SECRET`).
    ///
    /// `None` means no secret was configured; a random per-process key is
    /// used instead, so nonces do not survive a restart.
    pub nonce_secret: Option<Vec<u8>>,

    /// Nonce lifetime in seconds (default: 86400).
    pub nonce_lifetime_secs: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let nonce_secret = match env::var("NONCE_SECRET") {
            Ok(value) if !value.trim().is_empty() => Some(
                hex::decode(value.trim()).context("NONCE_SECRET must be hex-encoded")?,
            ),
            _ => None,
        };

        let nonce_lifetime_secs: i64 = env::var("NONCE_LIFETIME_SECS")
            .unwrap_or_else(|_| DEFAULT_NONCE_LIFETIME_SECS.to_string())
            .parse()
            .context("NONCE_LIFETIME_SECS must be a valid integer")?;

        if nonce_lifetime_secs < 2 {
            bail!("NONCE_LIFETIME_SECS must be at least 2, got {nonce_lifetime_secs}");
        }

        Ok(Self {
            nonce_secret,
            nonce_lifetime_secs,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nonce_secret: None,
            nonce_lifetime_secs: DEFAULT_NONCE_LIFETIME_SECS,
        }
    }
}
