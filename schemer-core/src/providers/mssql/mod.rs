//! SQL Server schema provider.
//!
//! # Module Structure
//! - `connection`: Connection string parsing and the bb8/tiberius pool
//! - `queries`: `sys.*` catalog view queries and row decoding
//! - `type_mapping`: SQL Server to unified data type conversion
//!
//! SQL Server can describe a whole catalog in one query per metadata kind,
//! so this is a bulk provider: every reader accepts [`Scope::Catalog`] as
//! well as [`Scope::Table`].
//!
//! # Security Guarantees
//! - Only SELECT statements against catalog views are issued
//! - Passwords are zeroized and never appear in logs or errors

pub mod connection;
pub mod queries;
pub mod type_mapping;


use crate::error::ScanError;
use crate::models::{DatabaseType, TableKey};
use crate::providers::{
    BufferedRows, ColumnReader, ConstraintReader, IndexColumnReader, IndexReader, ObjectReader,
    SchemaProvider, Scope,
};
use crate::Result;
use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use tiberius::Row;

use connection::TiberiusConnectionManager;

pub use connection::{MssqlConnectInfo, parse_mssql_connection_string};
pub use queries::quote_name;
pub use type_mapping::map_mssql_type;

/// SQL Server schema provider over a bb8 pool of tiberius clients.
pub struct MssqlProvider {
    pool: Pool<TiberiusConnectionManager>,
    database: String,
}

impl std::fmt::Debug for MssqlProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlProvider")
            .field("database", &self.database)
            .field("pool_state", &self.pool.state())
            .finish_non_exhaustive()
    }
}

impl MssqlProvider {
    async fn client(&self) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| ScanError::connection_failed("Failed to check out SQL Server connection", e))
    }

    async fn fetch(&self, sql: String, params: &[&str], resource: &str) -> Result<Vec<Row>> {
        let mut conn = self.client().await?;
        queries::run(&mut *conn, sql, params, resource).await
    }
}

fn require_catalog(catalog: &str) -> Result<()> {
    if catalog.is_empty() {
        return Err(ScanError::configuration(
            "SQL Server catalog name cannot be empty",
        ));
    }
    Ok(())
}

#[async_trait]
impl SchemaProvider for MssqlProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }

    fn is_bulk_provider(&self) -> bool {
        true
    }

    async fn objects(&self, catalog: &str) -> Result<Box<dyn ObjectReader>> {
        require_catalog(catalog)?;
        let rows = self
            .fetch(queries::objects_sql(catalog), &[], "sys.objects")
            .await?;
        let rows = rows
            .iter()
            .map(queries::object_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn columns(&self, scope: Scope<'_>) -> Result<Box<dyn ColumnReader>> {
        require_catalog(scope.catalog())?;
        let rows = self
            .fetch(
                queries::columns_sql(scope),
                &queries::scope_params(scope),
                "sys.columns",
            )
            .await?;
        let rows = rows
            .iter()
            .map(queries::column_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn indexes(&self, scope: Scope<'_>) -> Result<Box<dyn IndexReader>> {
        require_catalog(scope.catalog())?;
        let rows = self
            .fetch(
                queries::indexes_sql(scope),
                &queries::scope_params(scope),
                "sys.indexes",
            )
            .await?;
        let rows = rows
            .iter()
            .map(queries::index_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn index_columns(
        &self,
        table: &TableKey,
        index_name: &str,
    ) -> Result<Box<dyn IndexColumnReader>> {
        require_catalog(&table.catalog)?;
        let rows = self
            .fetch(
                queries::index_columns_sql(&table.catalog),
                &queries::index_params(table, index_name),
                "sys.index_columns",
            )
            .await?;
        let rows = queries::index_column_rows(&rows)?;
        Ok(Box::new(BufferedRows::new(rows)))
    }

    async fn constraints(&self, scope: Scope<'_>) -> Result<Box<dyn ConstraintReader>> {
        require_catalog(scope.catalog())?;
        let rows = self
            .fetch(
                queries::constraints_sql(scope),
                &queries::scope_params(scope),
                "sys.key_constraints",
            )
            .await?;
        let rows = rows
            .iter()
            .map(queries::constraint_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(BufferedRows::new(rows)))
    }
}
