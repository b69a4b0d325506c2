//! Nonce (CSRF token) generation and verification.
//!
//! Nonces are stateless: a token is an HMAC over the current time tick, the
//! action it protects, and the requesting user's id and session token. A
//! tick is half the configured lifetime, and a token verifies during the
//! tick it was issued in and the one after it.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::config::Config;
use crate::error::ConfigError;
use crate::host::UserContext;

/// Form field carrying the submitted nonce.
pub const NONCE_FIELD: &str = "_nonce";

/// Form field carrying the URL the form was rendered on.
pub const REFERER_FIELD: &str = "_referer";

/// Number of hex characters kept from the HMAC digest.
const TOKEN_LEN: usize = 20;

/// How old a successfully verified nonce is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Issued during the current tick.
    Fresh,
    /// Issued during the previous tick.
    Aging,
}

/// Token service consumed by settings pages.
pub trait NonceService: Send + Sync {
    /// Create a token for `action`, scoped to `user`.
    fn create(&self, action: &str, user: &UserContext) -> String;

    /// Verify a submitted token. `None` means invalid or expired.
    fn verify(&self, token: &str, action: &str, user: &UserContext) -> Option<NonceAge>;
}

/// HMAC-SHA256 nonce service.
#[derive(Clone)]
pub struct HmacNonce {
    mac: Hmac<Sha256>,
    lifetime_secs: i64,
}

impl HmacNonce {
    /// Create a nonce service with the given key and lifetime.
    pub fn new(secret: &[u8], lifetime_secs: i64) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::InvalidSecret("secret is empty".to_string()));
        }
        if lifetime_secs < 2 {
            return Err(ConfigError::InvalidSecret(format!(
                "lifetime must be at least 2 seconds, got {lifetime_secs}"
            )));
        }
        let mac = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| ConfigError::InvalidSecret(e.to_string()))?;
        Ok(Self { mac, lifetime_secs })
    }

    /// Create a nonce service keyed with 32 random bytes.
    pub fn with_random_secret(lifetime_secs: i64) -> Result<Self, ConfigError> {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(&secret, lifetime_secs)
    }

    /// Build from runtime configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match &config.nonce_secret {
            Some(secret) => Self::new(secret, config.nonce_lifetime_secs),
            None => {
                warn!("NONCE_SECRET not set, nonces will not survive a restart");
                Self::with_random_secret(config.nonce_lifetime_secs)
            }
        }
    }

    /// Tick number for a point in time (rounded up, so it is never zero
    /// after the epoch).
    pub fn tick(&self, now: DateTime<Utc>) -> i64 {
        let half = self.lifetime_secs / 2;
        let secs = now.timestamp();
        secs.div_euclid(half) + i64::from(secs.rem_euclid(half) != 0)
    }

    /// Create a token at an explicit point in time.
    pub fn create_at(&self, action: &str, user: &UserContext, now: DateTime<Utc>) -> String {
        self.digest(self.tick(now), action, user)
    }

    /// Verify a token at an explicit point in time.
    pub fn verify_at(
        &self,
        token: &str,
        action: &str,
        user: &UserContext,
        now: DateTime<Utc>,
    ) -> Option<NonceAge> {
        if token.is_empty() {
            return None;
        }

        let tick = self.tick(now);
        let candidates = [(tick, NonceAge::Fresh), (tick - 1, NonceAge::Aging)];
        candidates.into_iter().find_map(|(t, age)| {
            let expected = self.digest(t, action, user);
            bool::from(expected.as_bytes().ct_eq(token.as_bytes())).then_some(age)
        })
    }

    fn digest(&self, tick: i64, action: &str, user: &UserContext) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{tick}|{action}|{}|{}", user.id, user.session_token).as_bytes());
        let mut token = hex::encode(mac.finalize().into_bytes());
        token.truncate(TOKEN_LEN);
        token
    }
}

impl NonceService for HmacNonce {
    fn create(&self, action: &str, user: &UserContext) -> String {
        self.create_at(action, user, Utc::now())
    }

    fn verify(&self, token: &str, action: &str, user: &UserContext) -> Option<NonceAge> {
        self.verify_at(token, action, user, Utc::now())
    }
}

impl std::fmt::Debug for HmacNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacNonce")
            .field("mac", &"HmacSha256")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn service() -> HmacNonce {
        HmacNonce::new(b"test-secret", 86_400).unwrap()
    }

    fn user() -> UserContext {
        UserContext::authenticated(Uuid::from_u128(7), "session-a", vec![])
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn token_format() {
        let token = service().create_at("save-demo:general", &user(), at(1_000_000));
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tick_rounds_up() {
        let svc = service();
        assert_eq!(svc.tick(at(43_200)), 1);
        assert_eq!(svc.tick(at(43_201)), 2);
        assert_eq!(svc.tick(at(86_400)), 2);
    }

    #[test]
    fn verifies_within_same_tick() {
        let svc = service();
        let token = svc.create_at("save-demo:general", &user(), at(1_000_000));
        assert_eq!(
            svc.verify_at(&token, "save-demo:general", &user(), at(1_000_100)),
            Some(NonceAge::Fresh)
        );
    }

    #[test]
    fn verifies_in_next_tick_as_aging() {
        let svc = service();
        let token = svc.create_at("save-demo:general", &user(), at(1_000_000));
        let later = at(1_000_000 + 43_200);
        assert_eq!(
            svc.verify_at(&token, "save-demo:general", &user(), later),
            Some(NonceAge::Aging)
        );
    }

    #[test]
    fn expires_after_two_ticks() {
        let svc = service();
        let token = svc.create_at("save-demo:general", &user(), at(1_000_000));
        let much_later = at(1_000_000 + 2 * 43_200);
        assert!(
            svc.verify_at(&token, "save-demo:general", &user(), much_later)
                .is_none()
        );
    }

    #[test]
    fn scoped_to_action() {
        let svc = service();
        let token = svc.create_at("save-demo:general", &user(), at(1_000_000));
        assert!(
            svc.verify_at(&token, "save-demo:advanced", &user(), at(1_000_000))
                .is_none()
        );
    }

    #[test]
    fn scoped_to_user_and_session() {
        let svc = service();
        let token = svc.create_at("save-demo:general", &user(), at(1_000_000));

        let other_user = UserContext::authenticated(Uuid::from_u128(8), "session-a", vec![]);
        assert!(
            svc.verify_at(&token, "save-demo:general", &other_user, at(1_000_000))
                .is_none()
        );

        let other_session = UserContext::authenticated(Uuid::from_u128(7), "session-b", vec![]);
        assert!(
            svc.verify_at(&token, "save-demo:general", &other_session, at(1_000_000))
                .is_none()
        );
    }

    #[test]
    fn empty_token_never_verifies() {
        let svc = service();
        assert!(
            svc.verify_at("", "save-demo:general", &user(), at(1_000_000))
                .is_none()
        );
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(HmacNonce::new(b"", 86_400).is_err());
        assert!(HmacNonce::new(b"key", 1).is_err());
    }
}
