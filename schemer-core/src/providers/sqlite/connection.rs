//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or `sqlite://./relative.db`
//! - Plain paths ending in `.db`, `.sqlite` or `.sqlite3`
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! Databases are opened read-only unless the [`ConnectionConfig`] says
//! otherwise.

use super::SqliteProvider;
use crate::error::ScanError;
use crate::providers::ConnectionConfig;
use crate::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use url::Url;

impl SqliteProvider {
    /// Opens a SQLite provider with default connection settings.
    ///
    /// # Errors
    /// Returns error if the connection string is malformed or the database
    /// cannot be opened
    pub async fn new(connection_string: &str) -> Result<Self> {
        Self::with_config(connection_string, &ConnectionConfig::default()).await
    }

    /// Opens a SQLite provider with custom connection settings.
    pub async fn with_config(connection_string: &str, config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        validate_sqlite_connection_string(connection_string)?;
        let pool = create_sqlite_pool(connection_string, config).await?;

        tracing::debug!(
            "Opened SQLite database '{}' ({})",
            extract_database_name(connection_string),
            config
        );

        Ok(Self {
            pool,
            database_name: extract_database_name(connection_string),
        })
    }

    /// Wraps an existing pool.
    ///
    /// The pool must allow concurrent acquisition; in-memory databases need
    /// a single shared connection (`max_connections(1)`) so every query sees
    /// the same database.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            database_name: "main".to_string(),
        }
    }

    /// File name of the database, `:memory:` or `main`
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Closes the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Validates SQLite connection string format.
///
/// # Errors
/// Returns a `Configuration` error if the string is not a SQLite URL, a
/// database file path, or `:memory:`
pub fn validate_sqlite_connection_string(connection_string: &str) -> Result<()> {
    if connection_string == ":memory:" || has_sqlite_extension(connection_string) {
        return Ok(());
    }

    if connection_string.starts_with("sqlite:") {
        if connection_string.contains(":memory:") || connection_string.contains("mode=memory") {
            return Ok(());
        }
        if let Ok(url) = Url::parse(connection_string)
            && url.scheme() != "sqlite"
        {
            return Err(ScanError::configuration(
                "Connection string must use sqlite:// scheme",
            ));
        }
        if connection_string.starts_with("sqlite://") {
            return Ok(());
        }
    }

    Err(ScanError::configuration(
        "Invalid SQLite connection string format: expected sqlite:// URL, file path, or :memory:",
    ))
}

pub(crate) fn has_sqlite_extension(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    path.ends_with(".db") || path.ends_with(".sqlite") || path.ends_with(".sqlite3")
}

/// Extracts the database file name from a connection string.
fn extract_database_name(connection_string: &str) -> String {
    if connection_string.contains(":memory:") || connection_string.contains("mode=memory") {
        return ":memory:".to_string();
    }

    let path = connection_string
        .strip_prefix("sqlite://")
        .unwrap_or(connection_string);
    let path = path.split('?').next().unwrap_or(path);

    match path.rsplit('/').next() {
        Some(filename) if !filename.is_empty() => filename.to_string(),
        _ => "main".to_string(),
    }
}

/// Normalizes connection string to SQLite URL format.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{}", connection_string)
}

async fn create_sqlite_pool(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<SqlitePool> {
    let normalized = normalize_connection_string(connection_string);
    let in_memory = extract_database_name(connection_string) == ":memory:";

    let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
        ScanError::configuration(format!("Invalid SQLite connection string: {}", e))
    })?;

    // An in-memory database cannot be opened read-only
    if config.read_only && !in_memory {
        options = options.read_only(true);
    }

    // Each in-memory connection is its own database
    let max_connections = if in_memory { 1 } else { config.max_connections };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| ScanError::connection_failed("Failed to open SQLite database", e))
}
