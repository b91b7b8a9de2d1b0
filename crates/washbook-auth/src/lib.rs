//! WASHBOOK Auth — credential verification, stateless session tokens,
//! password-reset lifecycle, and request gating.

pub mod access;
pub mod config;
pub mod error;
pub mod password;
pub mod pipeline;
pub mod reset;
pub mod token;

pub use access::{AccessMiddleware, authorize, extract_bearer};
pub use config::AuthConfig;
pub use error::AuthError;
pub use password::PasswordHasher;
pub use pipeline::{
    AuthOutput, AuthPipeline, ChangePasswordInput, LoginInput, ResetPasswordInput, SignupInput,
    SocialLoginInput, SocialLoginOutput,
};
pub use reset::ResetTokenManager;
pub use token::{TokenIssuer, VerifiedToken};
