//! SQLite schema provider.
//!
//! # Module Structure
//! - `connection`: Connection string handling and pool creation
//! - `queries`: `sqlite_master` and pragma table-valued function queries
//! - `type_mapping`: SQLite to unified data type conversion
//!
//! # SQLite-Specific Behavior
//! - No schema namespace: every table lives in schema `""`
//! - No catalog-wide introspection: readers are opened one table at a time,
//!   so [`Scope::Catalog`] is rejected and `is_bulk_provider()` is false
//! - Primary and foreign key constraints are unnamed in SQLite; names are
//!   synthesized as `pk_<table>` and `fk_<table>_<id>`
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT/PRAGMA only)
//! - File databases are opened read-only by default

pub mod connection;
mod queries;
pub mod type_mapping;


use crate::error::ScanError;
use crate::models::{DatabaseType, TableKey};
use crate::providers::{
    BufferedRows, ColumnReader, ConstraintReader, IndexColumnReader, IndexReader, ObjectReader,
    SchemaProvider, Scope,
};
use crate::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub use connection::validate_sqlite_connection_string;
pub use type_mapping::map_sqlite_type;

/// SQLite schema provider over a sqlx pool.
pub struct SqliteProvider {
    pool: SqlitePool,
    database_name: String,
}

impl std::fmt::Debug for SqliteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteProvider")
            .field("database_name", &self.database_name)
            .finish_non_exhaustive()
    }
}

impl SqliteProvider {
    /// Resolves a table-scoped call to the SQLite table name.
    fn table_name<'a>(&self, scope: Scope<'a>, operation: &str) -> Result<&'a str> {
        match scope {
            Scope::Catalog(_) => Err(ScanError::unsupported_feature(
                format!("catalog-wide {} scan", operation),
                DatabaseType::SQLite.to_string(),
            )),
            Scope::Table(key) => checked_table_name(key),
        }
    }
}

/// SQLite tables have no schema and always a name.
fn checked_table_name(key: &TableKey) -> Result<&str> {
    if !key.schema.is_empty() {
        return Err(ScanError::configuration(format!(
            "SQLite has no schema namespace, got schema '{}' for table '{}'",
            key.schema, key.name
        )));
    }
    if key.name.is_empty() {
        return Err(ScanError::configuration("SQLite table name cannot be empty"));
    }
    Ok(&key.name)
}

#[async_trait]
impl SchemaProvider for SqliteProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn is_bulk_provider(&self) -> bool {
        false
    }

    async fn objects(&self, catalog: &str) -> Result<Box<dyn ObjectReader>> {
        tracing::trace!("Querying SQLite objects for catalog '{}'", catalog);
        let rows = queries::fetch_objects(&self.pool).await?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn columns(&self, scope: Scope<'_>) -> Result<Box<dyn ColumnReader>> {
        let table = self.table_name(scope, "columns")?;
        let rows = queries::fetch_columns(&self.pool, table).await?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn indexes(&self, scope: Scope<'_>) -> Result<Box<dyn IndexReader>> {
        let table = self.table_name(scope, "indexes")?;
        let rows = queries::fetch_indexes(&self.pool, table).await?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn index_columns(
        &self,
        table: &TableKey,
        index_name: &str,
    ) -> Result<Box<dyn IndexColumnReader>> {
        checked_table_name(table)?;
        if index_name.is_empty() {
            return Err(ScanError::configuration("SQLite index name cannot be empty"));
        }
        let rows = queries::fetch_index_columns(&self.pool, index_name).await?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn constraints(&self, scope: Scope<'_>) -> Result<Box<dyn ConstraintReader>> {
        let table = self.table_name(scope, "constraints")?;
        let rows = queries::fetch_constraints(&self.pool, table).await?;
        Ok(Box::new(BufferedRows::new(rows)))
    }
}
