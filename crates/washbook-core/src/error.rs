//! Error types for the WASHBOOK system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WashbookError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Partial failure: {completed} succeeded but {failed} failed: {reason}")]
    PartialFailure {
        completed: String,
        failed: String,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WashbookError {
    /// HTTP status code a transport layer should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            WashbookError::Validation { .. } => 400,
            WashbookError::AuthenticationFailed { .. } => 401,
            WashbookError::AuthorizationDenied { .. } => 403,
            WashbookError::NotFound { .. } => 404,
            WashbookError::AlreadyExists { .. } => 409,
            WashbookError::Delivery(_)
            | WashbookError::PartialFailure { .. }
            | WashbookError::Database(_)
            | WashbookError::Crypto(_)
            | WashbookError::Internal(_) => 500,
        }
    }
}

pub type WashbookResult<T> = Result<T, WashbookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_contract() {
        let conflict = WashbookError::AlreadyExists {
            entity: "principal".into(),
        };
        assert_eq!(conflict.status_code(), 409);

        let unauthorized = WashbookError::AuthenticationFailed {
            reason: "bad credentials".into(),
        };
        assert_eq!(unauthorized.status_code(), 401);

        let forbidden = WashbookError::AuthorizationDenied {
            reason: "role".into(),
        };
        assert_eq!(forbidden.status_code(), 403);

        let delivery = WashbookError::Delivery("dispatch failed".into());
        assert_eq!(delivery.status_code(), 500);
    }
}
