//! Authentication pipeline — signup, login, social login, and the
//! password forgot/reset/change flows.
//!
//! Each flow is independent; the only state shared between them is the
//! principal record behind the [`CredentialStore`]. Hashing happens
//! here, before the store call, and email normalization is an explicit
//! step — the store receives canonical input and applies no hidden
//! hooks.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use washbook_core::error::{WashbookError, WashbookResult};
use washbook_core::models::principal::{
    CreatePrincipal, Principal, Provider, ResetWindow, Role, UpdatePrincipal,
};
use washbook_core::notify::{Notification, Notifier, action_email};
use washbook_core::store::CredentialStore;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::PasswordHasher;
use crate::reset::ResetTokenManager;
use crate::token::TokenIssuer;

/// Input for local signup. `password_confirm` is validated here and
/// never persisted.
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub preferred_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub social_media_handles: Vec<String>,
    pub password: String,
    pub password_confirm: String,
}

/// Input for local login.
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for federated login. No password is involved.
#[derive(Debug, Clone)]
pub struct SocialLoginInput {
    pub provider: Provider,
    pub social_id: String,
    pub name: String,
    pub email: String,
}

/// Input for completing a password reset with an out-of-band secret.
#[derive(Debug, Clone)]
pub struct ResetPasswordInput {
    pub secret: String,
    pub password: String,
    pub password_confirm: String,
}

/// Input for an authenticated password change.
#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub password: String,
    pub password_confirm: String,
}

/// A freshly opened session: the bearer token plus the sanitized
/// principal it belongs to.
#[derive(Debug, Clone)]
pub struct AuthOutput {
    /// Signed session token.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub issued_at: DateTime<Utc>,
    /// Principal with secret fields stripped.
    pub principal: Principal,
}

impl AuthOutput {
    /// Render the `Set-Cookie` value mirroring the bearer token. The
    /// cookie expires together with the token and is HTTP-only;
    /// `Secure` is added in production deployments.
    pub fn session_cookie(&self, config: &AuthConfig) -> String {
        let expires = self.issued_at + Duration::days(config.token_ttl_days);
        let mut cookie = format!(
            "jwt={}; Expires={}; Path=/; HttpOnly; SameSite=Lax",
            self.token,
            expires.format("%a, %d %b %Y %H:%M:%S GMT"),
        );
        if config.production {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Result of a social login, distinguishing first sighting (201) from
/// an existing principal (200).
#[derive(Debug, Clone)]
pub struct SocialLoginOutput {
    pub auth: AuthOutput,
    pub created: bool,
}

/// Composes hasher, token issuer, reset manager, store, and notifier
/// into the auth flows.
///
/// Generic over the store and notifier so the subsystem carries no
/// dependency on the database or mail crates.
pub struct AuthPipeline<S: CredentialStore, N: Notifier> {
    store: S,
    notifier: N,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    reset: ResetTokenManager,
    config: AuthConfig,
}

impl<S: CredentialStore, N: Notifier + Clone + 'static> AuthPipeline<S, N> {
    pub fn new(store: S, notifier: N, config: AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            hasher: PasswordHasher::new(&config),
            issuer: TokenIssuer::new(&config)?,
            reset: ResetTokenManager::new(&config),
            store,
            notifier,
            config,
        })
    }

    /// Register a local-provider principal.
    ///
    /// A duplicate email surfaces as `AlreadyExists` (409) from the
    /// store's unique-email guarantee. The welcome notification is
    /// best-effort and dispatched off the response path: a slow or
    /// failing mail provider never delays or fails the signup.
    pub async fn signup(&self, input: SignupInput) -> WashbookResult<AuthOutput> {
        self.validate_signup(&input)?;
        let email = normalize_email(&input.email);

        let password_hash = self.hasher.hash(&input.password).await?;

        let principal = self
            .store
            .create(CreatePrincipal {
                preferred_name: input.preferred_name.trim().to_owned(),
                email,
                phone: Some(input.phone),
                address: Some(input.address),
                social_media_handles: input.social_media_handles,
                provider: Provider::Local,
                role: Role::User,
                password_hash: Some(password_hash),
                social_login_id: None,
            })
            .await?;

        info!(principal = %principal.id, "new principal signed up");
        self.send_welcome(&principal);

        self.open_session(principal)
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email, inactive account, passwordless (federated)
    /// account, and wrong password all produce the identical error so
    /// callers cannot probe which emails are registered.
    pub async fn login(&self, input: LoginInput) -> WashbookResult<AuthOutput> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(WashbookError::Validation {
                message: "please provide email and password".into(),
            });
        }

        let principal = self
            .store
            .get_by_email(&normalize_email(&input.email))
            .await
            .map_err(|e| match e {
                WashbookError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                other => other,
            })?;

        let Some(digest) = principal.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if !self.hasher.compare(&input.password, digest).await {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.open_session(principal)
    }

    /// Authenticate via a federated identity. The first sighting of a
    /// `(provider, email)` pair creates a passwordless principal;
    /// later sightings resolve to it.
    pub async fn social_login(&self, input: SocialLoginInput) -> WashbookResult<SocialLoginOutput> {
        if input.social_id.trim().is_empty() || input.email.trim().is_empty() {
            return Err(WashbookError::Validation {
                message: "could not detect your email and id".into(),
            });
        }
        if input.provider == Provider::Local {
            return Err(WashbookError::Validation {
                message: "social login requires a federated provider".into(),
            });
        }

        let email = normalize_email(&input.email);
        match self.store.get_by_email(&email).await {
            Ok(existing) => Ok(SocialLoginOutput {
                auth: self.open_session(existing)?,
                created: false,
            }),
            Err(WashbookError::NotFound { .. }) => {
                let principal = self
                    .store
                    .create(CreatePrincipal {
                        preferred_name: input.name.trim().to_owned(),
                        email,
                        phone: None,
                        address: None,
                        social_media_handles: vec![],
                        provider: input.provider,
                        role: Role::User,
                        password_hash: None,
                        social_login_id: Some(input.social_id),
                    })
                    .await?;

                info!(
                    principal = %principal.id,
                    provider = principal.provider.as_str(),
                    "created principal from first federated sighting"
                );
                self.send_welcome(&principal);

                Ok(SocialLoginOutput {
                    auth: self.open_session(principal)?,
                    created: true,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Open a reset window and dispatch the secret out-of-band.
    ///
    /// Delivery is awaited: an undelivered but persisted secret is a
    /// security liability, so a dispatch failure rolls the window back
    /// and reports `Delivery` (500). If that rollback itself fails the
    /// condition is surfaced as `PartialFailure` instead of being
    /// swallowed.
    pub async fn forgot_password(&self, email: &str) -> WashbookResult<()> {
        // Unknown email is a plain 404 here; enumeration is accepted
        // for this flow.
        let principal = self.store.get_by_email(&normalize_email(email)).await?;

        let grant = self.reset.generate();
        self.store
            .update(
                principal.id,
                UpdatePrincipal {
                    reset_window: Some(Some(ResetWindow {
                        digest: grant.digest,
                        expires_at: grant.expires_at,
                    })),
                    ..Default::default()
                },
            )
            .await?;

        let minutes = self.config.reset_token_ttl_secs / 60;
        let link = format!(
            "{}/reset-password/{}",
            self.config.front_end_url, grant.secret
        );
        let notification = Notification {
            to: principal.email.clone(),
            subject: format!("Reset your password (valid for {minutes} minutes)"),
            html: action_email(
                "Reset Password",
                &format!(
                    "You are getting this email because you requested a password \
                     reset. The link below is only valid for the next {minutes} \
                     minutes. If you did not request this, you can ignore it.",
                ),
                "Reset Password",
                &link,
            ),
        };

        if let Err(delivery_err) = self.notifier.send(notification).await {
            warn!(
                principal = %principal.id,
                error = %delivery_err,
                "reset dispatch failed, rolling back reset window"
            );
            let rollback = self
                .store
                .update(
                    principal.id,
                    UpdatePrincipal {
                        reset_window: Some(None),
                        ..Default::default()
                    },
                )
                .await;
            return match rollback {
                Ok(_) => Err(WashbookError::Delivery(delivery_err.to_string())),
                Err(rollback_err) => Err(WashbookError::PartialFailure {
                    completed: "reset window persisted".into(),
                    failed: "dispatch and rollback".into(),
                    reason: format!("{delivery_err}; rollback: {rollback_err}"),
                }),
            };
        }

        Ok(())
    }

    /// Complete a reset with the out-of-band secret: set the new
    /// password, clear the window (single use), record the credential
    /// change, and open a fresh session.
    pub async fn reset_password(&self, input: ResetPasswordInput) -> WashbookResult<AuthOutput> {
        let principal = self.reset.verify(&self.store, &input.secret).await?;
        self.validate_new_password(&input.password, &input.password_confirm)?;

        let password_hash = self.hasher.hash(&input.password).await?;
        let updated = self
            .store
            .update(
                principal.id,
                UpdatePrincipal {
                    password_hash: Some(password_hash),
                    password_changed_at: Some(credential_changed_at()),
                    reset_window: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        info!(principal = %updated.id, "password reset completed");
        self.open_session(updated)
    }

    /// Change the password of an already-authenticated principal.
    pub async fn change_password(
        &self,
        principal_id: Uuid,
        input: ChangePasswordInput,
    ) -> WashbookResult<AuthOutput> {
        let principal = self
            .store
            .get_by_id(principal_id)
            .await
            .map_err(|e| match e {
                WashbookError::NotFound { .. } => AuthError::PrincipalGone.into(),
                other => other,
            })?;

        let Some(digest) = principal.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if !self.hasher.compare(&input.current_password, digest).await {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.validate_new_password(&input.password, &input.password_confirm)?;
        let password_hash = self.hasher.hash(&input.password).await?;

        let updated = self
            .store
            .update(
                principal.id,
                UpdatePrincipal {
                    password_hash: Some(password_hash),
                    password_changed_at: Some(credential_changed_at()),
                    ..Default::default()
                },
            )
            .await?;

        info!(principal = %updated.id, "password changed");
        self.open_session(updated)
    }

    /// Issue a token for a principal and package the session output.
    fn open_session(&self, principal: Principal) -> WashbookResult<AuthOutput> {
        let issued_at = Utc::now();
        let token = self
            .issuer
            .issue(principal.id, issued_at)
            .map_err(WashbookError::from)?;
        Ok(AuthOutput {
            token,
            expires_in: self.issuer.ttl_secs(),
            issued_at,
            principal: principal.sanitized(),
        })
    }

    /// Welcome mail is a courtesy: dispatched on a detached task so the
    /// caller never waits on the provider, failures logged and dropped.
    fn send_welcome(&self, principal: &Principal) {
        let notification = Notification {
            to: principal.email.clone(),
            subject: "Welcome to Washbook".into(),
            html: action_email(
                &format!("Hi {}", principal.preferred_name),
                "Your account has been created successfully. You can now sign \
                 in and book your first service.",
                "Sign In",
                &format!("{}/signin", self.config.front_end_url),
            ),
        };
        let notifier = self.notifier.clone();
        let principal_id = principal.id;
        tokio::spawn(async move {
            if let Err(e) = notifier.send(notification).await {
                warn!(principal = %principal_id, error = %e, "welcome dispatch failed");
            }
        });
    }

    fn validate_signup(&self, input: &SignupInput) -> WashbookResult<()> {
        if input.preferred_name.trim().len() < 3 {
            return Err(validation("preferred name must be at least 3 characters"));
        }
        if !is_valid_email(input.email.trim()) {
            return Err(validation("please provide a valid email address"));
        }
        if input.phone.trim().is_empty() {
            return Err(validation("phone number is required for local accounts"));
        }
        if input.address.trim().is_empty() {
            return Err(validation("address is required for local accounts"));
        }
        self.validate_new_password(&input.password, &input.password_confirm)
    }

    fn validate_new_password(&self, password: &str, confirm: &str) -> WashbookResult<()> {
        if password.len() < self.config.min_password_length {
            return Err(validation(&format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        if password != confirm {
            return Err(validation("passwords do not match"));
        }
        Ok(())
    }
}

fn validation(message: &str) -> WashbookError {
    WashbookError::Validation {
        message: message.into(),
    }
}

/// Canonical email form used for every store call.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Timestamp recorded on a credential change, backdated one second so
/// the token issued moments later does not itself appear to predate
/// the change.
fn credential_changed_at() -> DateTime<Utc> {
    Utc::now() - Duration::seconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Thandi@Example.COM "), "thandi@example.com");
    }

    #[test]
    fn email_validation_rejects_junk() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a x@x.com"));
        assert!(!is_valid_email("ax.com"));
    }

    #[test]
    fn changed_at_is_backdated() {
        let now = Utc::now();
        let stamp = credential_changed_at();
        assert!(stamp < now);
        assert!(now - stamp < Duration::seconds(5));
    }
}
