//! Washbook Server — application entry point.
//!
//! Wires configuration, the database, and the auth subsystem together.
//! Transport (HTTP routing) is mounted on top of the pipeline and
//! middleware constructed here.

use std::env;

use tracing_subscriber::EnvFilter;

use washbook_auth::{AccessMiddleware, AuthConfig, AuthPipeline};
use washbook_db::{DbConfig, DbManager, SurrealCredentialStore};
use washbook_notify::{NotifyConfig, SendGridNotifier};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("washbook=info")),
        )
        .json()
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("starting washbook server");

    let db_config = load_db_config();
    let manager = DbManager::connect(&db_config).await?;

    let store = SurrealCredentialStore::new(manager.client().clone());
    let notifier = SendGridNotifier::new(NotifyConfig::from_env()?)?;
    let auth_config = load_auth_config()?;

    let _pipeline = AuthPipeline::new(store.clone(), notifier, auth_config.clone())?;
    let _middleware = AccessMiddleware::new(store, &auth_config)?;

    tracing::info!("auth subsystem ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    Ok(())
}

fn load_db_config() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: env_or("WASHBOOK_DB_URL", &defaults.url),
        namespace: env_or("WASHBOOK_DB_NAMESPACE", &defaults.namespace),
        database: env_or("WASHBOOK_DB_DATABASE", &defaults.database),
        username: env_or("WASHBOOK_DB_USERNAME", &defaults.username),
        password: env_or("WASHBOOK_DB_PASSWORD", &defaults.password),
    }
}

fn load_auth_config() -> Result<AuthConfig, Box<dyn std::error::Error>> {
    let private_key_path = require_env("WASHBOOK_JWT_PRIVATE_KEY_FILE")?;
    let public_key_path = require_env("WASHBOOK_JWT_PUBLIC_KEY_FILE")?;

    let defaults = AuthConfig::default();
    Ok(AuthConfig {
        jwt_private_key_pem: std::fs::read_to_string(&private_key_path)?,
        jwt_public_key_pem: std::fs::read_to_string(&public_key_path)?,
        jwt_issuer: env_or("WASHBOOK_JWT_ISSUER", &defaults.jwt_issuer),
        pepper: env::var("WASHBOOK_PASSWORD_PEPPER").ok(),
        front_end_url: env_or("WASHBOOK_FRONTEND_URL", &defaults.front_end_url),
        production: env::var("WASHBOOK_ENV").is_ok_and(|v| v == "production"),
        ..defaults
    })
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &'static str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("missing env var: {key}"))
}
