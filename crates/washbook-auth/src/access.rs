//! Request-side guards: token authentication and role authorization.

use washbook_core::error::{WashbookError, WashbookResult};
use washbook_core::models::principal::{Principal, Role};
use washbook_core::store::CredentialStore;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::TokenIssuer;

/// Resolves a bearer token to a live principal.
///
/// Verification alone is not enough for a stateless token: the subject
/// must still exist, still be active, and must not have changed their
/// password since the token was issued. All three checks happen on
/// every call.
pub struct AccessMiddleware<S: CredentialStore> {
    store: S,
    issuer: TokenIssuer,
}

impl<S: CredentialStore> AccessMiddleware<S> {
    pub fn new(store: S, config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            store,
            issuer: TokenIssuer::new(config)?,
        })
    }

    /// Authenticate a request from its `Authorization` header value.
    ///
    /// Returns the full principal record on success. Every failure maps
    /// to a 401: missing or non-bearer header, bad signature, expiry,
    /// a vanished or deactivated subject, and a token that predates the
    /// subject's last password change.
    pub async fn authenticate(&self, authorization: Option<&str>) -> WashbookResult<Principal> {
        let token = extract_bearer(authorization).ok_or(AuthError::NotLoggedIn)?;
        let verified = self.issuer.verify(token)?;

        let principal = self
            .store
            .get_by_id(verified.principal_id)
            .await
            .map_err(|e| match e {
                WashbookError::NotFound { .. } => AuthError::PrincipalGone.into(),
                other => other,
            })?;

        if principal.password_changed_after(verified.issued_at) {
            return Err(AuthError::PasswordChanged.into());
        }

        Ok(principal)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
/// value. Any other scheme, or an empty token, yields `None`.
pub fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let token = authorization?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Check an authenticated principal against an allow-list of roles.
pub fn authorize(principal: &Principal, allowed: &[Role]) -> WashbookResult<()> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(WashbookError::AuthorizationDenied {
            reason: "you do not have permission to perform this action".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(Some("Bearer ")), None);
        assert_eq!(extract_bearer(Some("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer(Some("abc.def.ghi")), None);
        assert_eq!(extract_bearer(None), None);
    }
}
