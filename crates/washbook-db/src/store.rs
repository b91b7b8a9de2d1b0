//! SurrealDB implementation of [`CredentialStore`].
//!
//! Authentication lookups (`get_by_id`, `get_by_email`,
//! `get_by_reset_digest`) filter on `active = true`, and the reset
//! lookup additionally on an unexpired window, so deactivated
//! principals and stale reset secrets are invisible here rather than
//! special-cased by callers.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use washbook_core::error::WashbookResult;
use washbook_core::models::principal::{
    CreatePrincipal, Principal, Provider, Role, UpdatePrincipal,
};
use washbook_core::store::{CredentialStore, PaginatedResult, Pagination};

use crate::error::DbError;
use crate::schema::PRINCIPAL_EMAIL_INDEX;

/// SurrealDB has no structured error kind for unique-index violations;
/// the index name in the message is the stable part to match on.
fn is_duplicate_email(e: &surrealdb::Error) -> bool {
    e.to_string().contains(PRINCIPAL_EMAIL_INDEX)
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PrincipalRow {
    preferred_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    social_media_handles: Vec<String>,
    provider: String,
    role: String,
    password_hash: Option<String>,
    password_changed_at: Option<DateTime<Utc>>,
    password_reset_digest: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    social_login_id: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PrincipalRowWithId {
    record_id: String,
    preferred_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    social_media_handles: Vec<String>,
    provider: String,
    role: String,
    password_hash: Option<String>,
    password_changed_at: Option<DateTime<Utc>>,
    password_reset_digest: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    social_login_id: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_provider(s: &str) -> Result<Provider, DbError> {
    match s {
        "local" => Ok(Provider::Local),
        "google" => Ok(Provider::Google),
        "facebook" => Ok(Provider::Facebook),
        other => Err(DbError::Migration(format!("unknown provider: {other}"))),
    }
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "user" => Ok(Role::User),
        "admin" => Ok(Role::Admin),
        other => Err(DbError::Migration(format!("unknown role: {other}"))),
    }
}

impl PrincipalRow {
    fn into_principal(self, id: Uuid) -> Result<Principal, DbError> {
        Ok(Principal {
            id,
            preferred_name: self.preferred_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            social_media_handles: self.social_media_handles,
            provider: parse_provider(&self.provider)?,
            role: parse_role(&self.role)?,
            password_hash: self.password_hash,
            password_changed_at: self.password_changed_at,
            password_reset_digest: self.password_reset_digest,
            password_reset_expires_at: self.password_reset_expires_at,
            social_login_id: self.social_login_id,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PrincipalRowWithId {
    fn try_into_principal(self) -> Result<Principal, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Principal {
            id,
            preferred_name: self.preferred_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            social_media_handles: self.social_media_handles,
            provider: parse_provider(&self.provider)?,
            role: parse_role(&self.role)?,
            password_hash: self.password_hash,
            password_changed_at: self.password_changed_at,
            password_reset_digest: self.password_reset_digest,
            password_reset_expires_at: self.password_reset_expires_at,
            social_login_id: self.social_login_id,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB-backed credential store.
#[derive(Clone)]
pub struct SurrealCredentialStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCredentialStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CredentialStore for SurrealCredentialStore<C> {
    async fn create(&self, input: CreatePrincipal) -> WashbookResult<Principal> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('principal', $id) SET \
                 preferred_name = $preferred_name, \
                 email = $email, \
                 phone = $phone, \
                 address = $address, \
                 social_media_handles = $social_media_handles, \
                 provider = $provider, \
                 role = $role, \
                 password_hash = $password_hash, \
                 password_changed_at = NONE, \
                 password_reset_digest = NONE, \
                 password_reset_expires_at = NONE, \
                 social_login_id = $social_login_id, \
                 active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("preferred_name", input.preferred_name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("address", input.address))
            .bind(("social_media_handles", input.social_media_handles))
            .bind(("provider", input.provider.as_str().to_string()))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("password_hash", input.password_hash))
            .bind(("social_login_id", input.social_login_id))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(r) => r,
            // Unique-email index violation surfaces as a 409.
            Err(e) if is_duplicate_email(&e) => {
                return Err(DbError::Duplicate {
                    entity: "principal".into(),
                }
                .into());
            }
            Err(e) => return Err(DbError::Surreal(e).into()),
        };

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;

        Ok(row.into_principal(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WashbookResult<Principal> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('principal', $id) \
                 WHERE active = true",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;

        Ok(row.into_principal(id)?)
    }

    async fn get_by_email(&self, email: &str) -> WashbookResult<Principal> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM principal \
                 WHERE email = $email AND active = true",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_principal()?)
    }

    async fn get_by_reset_digest(&self, digest: &str) -> WashbookResult<Principal> {
        // An expired window never matches, so a stale secret is
        // indistinguishable from an unknown one.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM principal \
                 WHERE password_reset_digest = $digest \
                 AND password_reset_expires_at > time::now() \
                 AND active = true",
            )
            .bind(("digest", digest.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: "reset-digest".into(),
        })?;

        Ok(row.try_into_principal()?)
    }

    async fn update(&self, id: Uuid, input: UpdatePrincipal) -> WashbookResult<Principal> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.preferred_name.is_some() {
            sets.push("preferred_name = $preferred_name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.social_media_handles.is_some() {
            sets.push("social_media_handles = $social_media_handles");
        }
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.password_changed_at.is_some() {
            sets.push("password_changed_at = $password_changed_at");
        }
        match &input.reset_window {
            Some(Some(_)) => {
                sets.push("password_reset_digest = $reset_digest");
                sets.push("password_reset_expires_at = $reset_expires_at");
            }
            // Both fields clear together.
            Some(None) => {
                sets.push("password_reset_digest = NONE");
                sets.push("password_reset_expires_at = NONE");
            }
            None => {}
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('principal', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(preferred_name) = input.preferred_name {
            builder = builder.bind(("preferred_name", preferred_name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(social_media_handles) = input.social_media_handles {
            builder = builder.bind(("social_media_handles", social_media_handles));
        }
        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(password_changed_at) = input.password_changed_at {
            builder = builder.bind(("password_changed_at", password_changed_at));
        }
        if let Some(Some(window)) = input.reset_window {
            builder = builder
                .bind(("reset_digest", window.digest))
                .bind(("reset_expires_at", window.expires_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = match result.check() {
            Ok(r) => r,
            Err(e) if is_duplicate_email(&e) => {
                return Err(DbError::Duplicate {
                    entity: "principal".into(),
                }
                .into());
            }
            Err(e) => return Err(DbError::Surreal(e).into()),
        };

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;

        Ok(row.into_principal(id)?)
    }

    async fn deactivate(&self, id: Uuid) -> WashbookResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('principal', $id) SET \
                 active = false, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "principal".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> WashbookResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('principal', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "principal".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WashbookResult<PaginatedResult<Principal>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM principal GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM principal \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_principal())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
