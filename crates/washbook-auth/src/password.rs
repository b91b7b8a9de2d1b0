//! Password hashing and verification using Argon2id.
//!
//! Both operations run the adaptive hash on `spawn_blocking` so the
//! deliberately slow work never stalls the cooperative scheduler.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// One-way adaptive hasher with a configurable work factor and an
/// optional server-side pepper.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    pepper: Option<String>,
}

impl PasswordHasher {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
            pepper: config.pepper.clone(),
        }
    }

    /// Hash a plaintext password into a PHC-format Argon2id digest.
    /// Salt is randomly generated per call.
    pub async fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let hasher = self.clone();
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&plaintext))
            .await
            .map_err(|e| AuthError::Crypto(format!("hash task failed: {e}")))?
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// Never fails: a malformed digest or an internal verifier error
    /// reports `false`, exactly like a mismatch.
    pub async fn compare(&self, plaintext: &str, digest: &str) -> bool {
        let hasher = self.clone();
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || hasher.compare_blocking(&plaintext, &digest))
            .await
            .unwrap_or(false)
    }

    fn algorithm(&self) -> Result<Argon2<'static>, AuthError> {
        let params = argon2::Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }

    fn peppered(&self, plaintext: &str) -> Vec<u8> {
        match &self.pepper {
            Some(p) => format!("{p}{plaintext}").into_bytes(),
            None => plaintext.as_bytes().to_vec(),
        }
    }

    fn hash_blocking(&self, plaintext: &str) -> Result<String, AuthError> {
        let argon2 = self.algorithm()?;
        let salt = SaltString::generate(&mut OsRng);
        let digest = argon2
            .hash_password(&self.peppered(plaintext), &salt)
            .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;
        Ok(digest.to_string())
    }

    fn compare_blocking(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = argon2::PasswordHash::new(digest) else {
            return false;
        };
        let Ok(argon2) = self.algorithm() else {
            return false;
        };
        argon2
            .verify_password(&self.peppered(plaintext), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher(pepper: Option<&str>) -> PasswordHasher {
        // Cheap parameters keep the test suite fast.
        PasswordHasher {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            pepper: pepper.map(String::from),
        }
    }

    #[tokio::test]
    async fn correct_password_matches() {
        let h = hasher(None);
        let digest = h.hash("hunter2").await.unwrap();
        assert!(h.compare("hunter2", &digest).await);
    }

    #[tokio::test]
    async fn wrong_password_does_not_match() {
        let h = hasher(None);
        let digest = h.hash("hunter2").await.unwrap();
        assert!(!h.compare("wrong", &digest).await);
    }

    #[tokio::test]
    async fn digest_does_not_contain_plaintext() {
        let h = hasher(None);
        let digest = h.hash("correct-horse-battery").await.unwrap();
        assert!(!digest.contains("correct-horse-battery"));
        assert!(digest.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn salts_are_unique_per_hash() {
        let h = hasher(None);
        let a = h.hash("same-password").await.unwrap();
        let b = h.hash("same-password").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_digest_compares_false() {
        let h = hasher(None);
        assert!(!h.compare("pw", "not-a-phc-digest").await);
        assert!(!h.compare("pw", "").await);
    }

    #[tokio::test]
    async fn pepper_is_applied() {
        let with = hasher(Some("pepper!"));
        let without = hasher(None);
        let digest = with.hash("hunter2").await.unwrap();
        assert!(with.compare("hunter2", &digest).await);
        assert!(!without.compare("hunter2", &digest).await);
    }
}
