//! WASHBOOK Database — SurrealDB connection management, schema
//! migrations, and the [`SurrealCredentialStore`] implementation of
//! the core credential-store trait.

mod connection;
mod error;
mod schema;
mod store;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
pub use store::SurrealCredentialStore;
