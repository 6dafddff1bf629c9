use std::time::Duration;

use anyhow::{Result, bail};
use sea_orm::{ConnectOptions, Database, DatabaseBackend, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;

const CONNECT_TIMEOUT_SECS: u64 = 5;

pub async fn connect(cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
    let backend = backend_for_url(&cfg.url)?;

    let mut options = ConnectOptions::new(cfg.url.clone());
    options
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_idle)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(backend = ?backend, "connected to database");

    info!("syncing database schema from entities");
    db.get_schema_registry("library_accounts::db::entities::*")
        .sync(&db)
        .await?;
    Ok(db)
}

/// Picks the backend from the URL scheme; only Postgres and SQLite are compiled in.
pub fn backend_for_url(url: &str) -> Result<DatabaseBackend> {
    let normalized = url.trim().to_ascii_lowercase();
    if normalized.starts_with("postgres://") || normalized.starts_with("postgresql://") {
        return Ok(DatabaseBackend::Postgres);
    }
    if normalized.starts_with("sqlite:") {
        return Ok(DatabaseBackend::Sqlite);
    }

    bail!(
        "unsupported database url '{}'; expected scheme postgres://, postgresql://, or sqlite://",
        redact_url(url)
    )
}

fn redact_url(url: &str) -> String {
    let trimmed = url.trim();
    if let Some((scheme, _)) = trimmed.split_once("://") {
        format!("{scheme}://<redacted>")
    } else if let Some((scheme, _)) = trimmed.split_once(':') {
        format!("{scheme}:<redacted>")
    } else {
        "<invalid-url>".to_string()
    }
}
