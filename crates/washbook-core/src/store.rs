//! Credential store trait — the persistence abstraction the auth
//! subsystem consumes.
//!
//! All operations are async. The store is an external collaborator and
//! is assumed to serialize conflicting writes per record, so
//! check-then-set updates of a single principal need no extra locking
//! here.
//!
//! # Store contract
//!
//! - `create` enforces email uniqueness and reports a duplicate as
//!   [`WashbookError::AlreadyExists`].
//! - Every lookup used by authentication (`get_by_id`, `get_by_email`,
//!   `get_by_reset_digest`) returns **active principals only**. This is
//!   an explicit, documented guarantee of the abstraction, not a hidden
//!   query hook: a deactivated principal is invisible to login, token
//!   resolution, and password reset alike.
//! - `get_by_reset_digest` additionally matches only an unexpired reset
//!   window; an expired match is indistinguishable from no match.
//! - Callers pass emails already normalized (trimmed, lowercased).

use std::future::Future;

use uuid::Uuid;

use crate::error::WashbookResult;
use crate::models::principal::{CreatePrincipal, Principal, UpdatePrincipal};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait CredentialStore: Send + Sync {
    fn create(
        &self,
        input: CreatePrincipal,
    ) -> impl Future<Output = WashbookResult<Principal>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WashbookResult<Principal>> + Send;

    fn get_by_email(&self, email: &str) -> impl Future<Output = WashbookResult<Principal>> + Send;

    /// Look up the principal holding an unexpired reset window whose
    /// stored digest matches.
    fn get_by_reset_digest(
        &self,
        digest: &str,
    ) -> impl Future<Output = WashbookResult<Principal>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdatePrincipal,
    ) -> impl Future<Output = WashbookResult<Principal>> + Send;

    /// Soft delete: flips `active` to false. The record survives but
    /// disappears from all authentication lookups. Reports `NotFound`
    /// for an unknown id.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = WashbookResult<()>> + Send;

    /// Hard delete. Terminal. Reports `NotFound` for an unknown id.
    fn delete(&self, id: Uuid) -> impl Future<Output = WashbookResult<()>> + Send;

    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WashbookResult<PaginatedResult<Principal>>> + Send;
}
