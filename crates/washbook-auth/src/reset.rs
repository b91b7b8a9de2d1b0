//! One-time, time-boxed password-reset secrets.
//!
//! The plaintext secret travels out-of-band (an email link) and is
//! never persisted; only its SHA-256 digest and an expiry land on the
//! principal record. Single-use and rollback behavior live in the
//! pipeline, which clears the window on success and on delivery
//! failure.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use washbook_core::error::{WashbookError, WashbookResult};
use washbook_core::models::principal::Principal;
use washbook_core::store::CredentialStore;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// A freshly generated reset secret plus the values to persist.
#[derive(Debug, Clone)]
pub struct ResetGrant {
    /// Plaintext secret for the out-of-band link. Never stored.
    pub secret: String,
    /// Hex SHA-256 of the secret — the only stored form.
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

pub struct ResetTokenManager {
    ttl: Duration,
}

impl ResetTokenManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            ttl: Duration::seconds(config.reset_token_ttl_secs),
        }
    }

    /// Generate a cryptographically random secret (32 bytes,
    /// base64url, no padding) with its digest and expiry.
    pub fn generate(&self) -> ResetGrant {
        let mut rng = rand::rng();
        let bytes: [u8; 32] = rand::Rng::random(&mut rng);
        let secret = URL_SAFE_NO_PAD.encode(bytes);
        ResetGrant {
            digest: digest_secret(&secret),
            secret,
            expires_at: Utc::now() + self.ttl,
        }
    }

    /// Resolve a plaintext secret to its principal.
    ///
    /// The store matches only unexpired windows of active principals,
    /// so an expired secret fails exactly like an unknown one.
    pub async fn verify<S: CredentialStore>(
        &self,
        store: &S,
        secret: &str,
    ) -> WashbookResult<Principal> {
        store
            .get_by_reset_digest(&digest_secret(secret))
            .await
            .map_err(|e| match e {
                WashbookError::NotFound { .. } => AuthError::ResetSecretInvalid.into(),
                other => other,
            })
    }
}

/// Hex SHA-256 of a plaintext reset secret.
pub fn digest_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ResetTokenManager {
        ResetTokenManager::new(&AuthConfig::default())
    }

    #[test]
    fn secret_is_url_safe() {
        let grant = manager().generate();
        // base64url characters only (A-Z a-z 0-9 - _), no padding.
        assert!(
            grant
                .secret
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        // 32 bytes → 43 base64url chars.
        assert_eq!(grant.secret.len(), 43);
    }

    #[test]
    fn digest_matches_secret_and_is_not_plaintext() {
        let grant = manager().generate();
        assert_eq!(grant.digest, digest_secret(&grant.secret));
        assert_ne!(grant.digest, grant.secret);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest_secret("some-secret"), digest_secret("some-secret"));
        assert_ne!(digest_secret("secret-a"), digest_secret("secret-b"));
    }

    #[test]
    fn expiry_uses_configured_ttl() {
        let before = Utc::now() + Duration::seconds(600);
        let grant = manager().generate();
        let after = Utc::now() + Duration::seconds(600);
        assert!(grant.expires_at >= before && grant.expires_at <= after);
    }

    #[test]
    fn consecutive_secrets_differ() {
        let m = manager();
        assert_ne!(m.generate().secret, m.generate().secret);
    }
}
