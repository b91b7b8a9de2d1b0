//! WASHBOOK Core — domain model and collaborator abstractions.
//!
//! This crate holds the types shared across the workspace: the
//! [`models::principal::Principal`] identity record, the
//! [`store::CredentialStore`] persistence abstraction, the
//! [`notify::Notifier`] outbound-mail abstraction, and the
//! [`error::WashbookError`] taxonomy.

pub mod error;
pub mod models;
pub mod notify;
pub mod store;
