//! Authentication error types.

use washbook_core::error::WashbookError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable bearer token on the request.
    #[error("you are not logged in")]
    NotLoggedIn,

    /// Deliberately shared by unknown-email, inactive-account and
    /// wrong-password so callers cannot enumerate accounts.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// Token verified but its subject no longer resolves.
    #[error("the principal for this token no longer exists")]
    PrincipalGone,

    /// Token predates the subject's last credential change.
    #[error("password was changed after this token was issued")]
    PasswordChanged,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("reset secret is invalid or has expired")]
    ResetSecretInvalid,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for WashbookError {
    fn from(err: AuthError) -> Self {
        match err {
            // 400 per the reset-password contract.
            AuthError::ResetSecretInvalid => WashbookError::Validation {
                message: err.to_string(),
            },
            AuthError::Crypto(msg) => WashbookError::Crypto(msg),
            AuthError::NotLoggedIn
            | AuthError::InvalidCredentials
            | AuthError::PrincipalGone
            | AuthError::PasswordChanged
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => WashbookError::AuthenticationFailed {
                reason: err.to_string(),
            },
        }
    }
}
