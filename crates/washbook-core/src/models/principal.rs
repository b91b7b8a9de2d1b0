//! Principal domain model — the authenticated identity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin of a principal's identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }
}

/// Closed role set. New roles are added here, never as string literals
/// at call sites.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// The authenticated identity record.
///
/// Secret-bearing fields (`password_hash` and the reset window) are
/// never serialized, so a principal embedded in an API response cannot
/// leak them.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub preferred_name: String,
    /// Unique, stored lowercased. Normalization is an explicit pipeline
    /// step before every store call.
    pub email: String,
    /// Mandatory when `provider == Local`.
    pub phone: Option<String>,
    /// Mandatory when `provider == Local`.
    pub address: Option<String>,
    pub social_media_handles: Vec<String>,
    pub provider: Provider,
    pub role: Role,
    /// Argon2id PHC digest. `Some` only for local-provider principals.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Timestamp of the last credential change; absent if never changed.
    pub password_changed_at: Option<DateTime<Utc>>,
    /// SHA-256 digest of an in-flight reset secret. Set and cleared
    /// together with `password_reset_expires_at`.
    #[serde(skip_serializing)]
    pub password_reset_digest: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    /// Subject identifier reported by a federated provider.
    pub social_login_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Whether the stored credential changed after a token with the
    /// given issuance time (Unix seconds) was signed. Such tokens are
    /// treated as revoked.
    pub fn password_changed_after(&self, token_issued_at: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => token_issued_at < changed_at.timestamp(),
            None => false,
        }
    }

    /// Copy with in-memory secret fields stripped, for embedding in
    /// flow outputs.
    pub fn sanitized(mut self) -> Self {
        self.password_hash = None;
        self.password_reset_digest = None;
        self.password_reset_expires_at = None;
        self
    }
}

/// Input for creating a principal. The password arrives here already
/// hashed — plaintext never crosses the store boundary.
#[derive(Debug, Clone)]
pub struct CreatePrincipal {
    pub preferred_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub social_media_handles: Vec<String>,
    pub provider: Provider,
    pub role: Role,
    pub password_hash: Option<String>,
    pub social_login_id: Option<String>,
}

/// The transient reset pair. Both fields are set and cleared together,
/// which keeps the "both absent outside a reset window" invariant
/// unrepresentable to break.
#[derive(Debug, Clone)]
pub struct ResetWindow {
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Partial update. `None` = no change. The reset window uses
/// `Some(Some(w))` = open, `Some(None)` = clear.
#[derive(Debug, Clone, Default)]
pub struct UpdatePrincipal {
    pub preferred_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub social_media_handles: Option<Vec<String>>,
    pub password_hash: Option<String>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub reset_window: Option<Option<ResetWindow>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            preferred_name: "Thandi".into(),
            email: "thandi@example.com".into(),
            phone: Some("+27821234567".into()),
            address: Some("12 Main Rd, Cape Town".into()),
            social_media_handles: vec![],
            provider: Provider::Local,
            role: Role::User,
            password_hash: Some("$argon2id$v=19$m=19456,t=2,p=1$abc$def".into()),
            password_changed_at: None,
            password_reset_digest: Some("deadbeef".into()),
            password_reset_expires_at: Some(Utc::now()),
            social_login_id: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn secret_fields_are_never_serialized() {
        let json = serde_json::to_value(principal()).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("password_hash"));
        assert!(!object.contains_key("password_reset_digest"));
        assert!(!object.contains_key("password_reset_expires_at"));
        assert_eq!(object["email"], "thandi@example.com");
    }

    #[test]
    fn sanitized_strips_in_memory_secrets() {
        let clean = principal().sanitized();
        assert!(clean.password_hash.is_none());
        assert!(clean.password_reset_digest.is_none());
        assert!(clean.password_reset_expires_at.is_none());
    }

    #[test]
    fn password_changed_after_compares_issuance_time() {
        let mut p = principal();
        p.password_changed_at = None;
        assert!(!p.password_changed_after(0));

        let changed = Utc::now();
        p.password_changed_at = Some(changed);
        assert!(p.password_changed_after(changed.timestamp() - 10));
        assert!(!p.password_changed_after(changed.timestamp() + 10));
    }

    #[test]
    fn role_and_provider_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&Provider::Facebook).unwrap(),
            "\"facebook\""
        );
        assert_eq!(Role::default(), Role::User);
    }
}
