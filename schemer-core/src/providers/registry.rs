//! Driver identifier to provider factory mapping.
//!
//! New dialects plug in by registering a [`ProviderFactory`]; nothing in
//! the scanner dispatches on driver names.
//!
//! # Example
//! ```rust,no_run
//! use schemer_core::providers::{ConnectionConfig, ProviderRegistry, detect_driver};
//!
//! # async fn example() -> schemer_core::Result<()> {
//! let registry = ProviderRegistry::with_defaults();
//! let url = "sqlite:///var/data/sales.db";
//! let provider = registry
//!     .open(detect_driver(url)?, url, &ConnectionConfig::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use super::{ConnectionConfig, SchemaProvider};
use crate::Result;
use crate::error::{ScanError, redact_database_url};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Creates providers for one driver.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Opens a provider for the connection string.
    ///
    /// # Errors
    /// Returns error if the connection string is invalid or the database
    /// cannot be reached
    async fn open(
        &self,
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn SchemaProvider>>;
}

/// Registered provider factories keyed by driver identifier.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("drivers", &self.drivers())
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every driver compiled into this build.
    ///
    /// - `sqlite3`, `sqlite` with the `sqlite` feature
    /// - `sqlserver`, `mssql` with the `mssql` feature
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "sqlite")]
        {
            let factory: Arc<dyn ProviderFactory> = Arc::new(SqliteFactory);
            registry.register("sqlite3", Arc::clone(&factory));
            registry.register("sqlite", factory);
        }

        #[cfg(feature = "mssql")]
        {
            let factory: Arc<dyn ProviderFactory> = Arc::new(MssqlFactory);
            registry.register("sqlserver", Arc::clone(&factory));
            registry.register("mssql", factory);
        }

        registry
    }

    /// Adds or replaces the factory for a driver identifier.
    pub fn register(&mut self, driver: impl Into<String>, factory: Arc<dyn ProviderFactory>) {
        let driver = driver.into();
        if self.factories.insert(driver.clone(), factory).is_some() {
            tracing::debug!("Replaced provider factory for driver '{}'", driver);
        }
    }

    /// Whether a driver identifier is registered
    pub fn contains(&self, driver: &str) -> bool {
        self.factories.contains_key(driver)
    }

    /// Registered driver identifiers in sorted order
    pub fn drivers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Opens a provider through the factory registered for `driver`.
    ///
    /// # Errors
    /// Returns a `Configuration` error naming the registered drivers when
    /// `driver` is unknown, otherwise whatever the factory returns
    pub async fn open(
        &self,
        driver: &str,
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn SchemaProvider>> {
        let factory = self.factories.get(driver).ok_or_else(|| {
            ScanError::configuration(format!(
                "Unknown driver '{}'; registered drivers: {}",
                driver,
                self.drivers().join(", ")
            ))
        })?;

        tracing::debug!(
            "Opening {} provider for {}",
            driver,
            redact_database_url(connection_string)
        );
        factory.open(connection_string, config).await
    }
}

/// Infers the driver identifier from a connection string.
///
/// # Errors
/// Returns a `Configuration` error if the format is not recognized
pub fn detect_driver(connection_string: &str) -> Result<&'static str> {
    let lower = connection_string.to_ascii_lowercase();
    if lower.starts_with("sqlserver://") || lower.starts_with("mssql://") {
        Ok("sqlserver")
    } else if lower.starts_with("sqlite:")
        || lower == ":memory:"
        || lower.ends_with(".db")
        || lower.ends_with(".sqlite")
        || lower.ends_with(".sqlite3")
    {
        Ok("sqlite3")
    } else {
        Err(ScanError::configuration(
            "Unrecognized database connection string format",
        ))
    }
}

#[cfg(feature = "sqlite")]
struct SqliteFactory;

#[cfg(feature = "sqlite")]
#[async_trait]
impl ProviderFactory for SqliteFactory {
    async fn open(
        &self,
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn SchemaProvider>> {
        let provider = super::sqlite::SqliteProvider::with_config(connection_string, config).await?;
        Ok(Box::new(provider))
    }
}

#[cfg(feature = "mssql")]
struct MssqlFactory;

#[cfg(feature = "mssql")]
#[async_trait]
impl ProviderFactory for MssqlFactory {
    async fn open(
        &self,
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn SchemaProvider>> {
        let provider = super::mssql::MssqlProvider::new(connection_string, config).await?;
        Ok(Box::new(provider))
    }
}
