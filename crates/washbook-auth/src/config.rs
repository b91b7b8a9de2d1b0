//! Authentication configuration.
//!
//! Every component takes this explicitly at construction. There is no
//! environment lookup and no process-wide state in this crate; the
//! server boundary is responsible for populating the struct.

/// Configuration for the authentication subsystem.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for token signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for token verification.
    pub jwt_public_key_pem: String,
    /// Token issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Session token lifetime in days (default: 30). The mirrored
    /// cookie expires together with the token.
    pub token_ttl_days: i64,
    /// Reset secret lifetime in seconds (default: 600 = 10 minutes).
    pub reset_token_ttl_secs: i64,
    /// Minimum password length for signup and password changes.
    pub min_password_length: usize,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Argon2id memory cost in KiB (default: 19456 = 19 MiB).
    pub argon2_memory_kib: u32,
    /// Argon2id iteration count (default: 2).
    pub argon2_iterations: u32,
    /// Argon2id parallelism (default: 1).
    pub argon2_parallelism: u32,
    /// Base URL the reset and sign-in links in outbound mail point at.
    pub front_end_url: String,
    /// Adds the `Secure` attribute to the session cookie.
    pub production: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            jwt_issuer: "washbook".into(),
            token_ttl_days: 30,
            reset_token_ttl_secs: 600,
            min_password_length: 4,
            pepper: None,
            // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            front_end_url: "http://localhost:3000".into(),
            production: false,
        }
    }
}
