//! Schema provider SPI and the dialect providers implementing it.
//!
//! A [`SchemaProvider`] opens five kinds of metadata readers. Each reader
//! yields rows through a single `next_*` method returning
//! `Result<Option<Row>>`: `Ok(None)` ends the stream. Readers release their
//! resources when dropped.
//!
//! # Ordering contract
//! Every reader delivers rows sorted ascending by `(schema, table[, ordinal])`.
//! Providers enforce this server-side with `ORDER BY`; the scanner's
//! sequential matcher depends on it.
//!
//! # Module Structure
//! - `config`: Connection configuration shared by the providers
//! - `helpers`: Row decoding helpers
//! - `registry`: Driver identifier to provider factory mapping
//! - Dialect modules (`sqlite`, `mssql`), feature-gated

use crate::{
    Result,
    models::{DatabaseType, TableKey, UnifiedDataType},
};
use async_trait::async_trait;

pub mod config;
pub mod registry;

pub use config::ConnectionConfig;
pub use registry::{ProviderFactory, ProviderRegistry, detect_driver};

/// What a reader is opened over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Every table in the named catalog, in one stream
    Catalog(&'a str),
    /// A single table
    Table(&'a TableKey),
}

impl Scope<'_> {
    pub fn catalog(&self) -> &str {
        match self {
            Scope::Catalog(name) => name,
            Scope::Table(key) => &key.catalog,
        }
    }
}

impl std::fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Catalog(name) => write!(f, "catalog {}", name),
            Scope::Table(key) => write!(f, "table {}", key),
        }
    }
}

/// Table or view row from the objects stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRow {
    pub schema: String,
    pub name: String,
    /// `"BASE TABLE"` or `"VIEW"`
    pub db_type: String,
}

/// Column row, ordered by `(schema, table, ordinal)`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRow {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub ordinal: u32,
    pub data_type: String,
    /// Native type mapped by the provider's dialect rules
    pub unified_type: UnifiedDataType,
    pub max_length: Option<i32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub is_nullable: bool,
    pub is_identity: bool,
    pub default_value: Option<String>,
}

/// Index row, ordered by `(schema, table, name)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub is_unique: bool,
    pub is_primary: bool,
    pub index_type: Option<String>,
}

/// Column of a single index, ordered by key position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumnRow {
    pub name: String,
    pub ordinal: u32,
    pub is_descending: bool,
    pub is_included: bool,
}

/// One column of a key constraint.
///
/// Rows of the same constraint arrive adjacent, grouped by
/// `(schema, table, constraint_type, constraint_name)` and ordered by
/// column position within the constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRow {
    pub schema: String,
    pub table: String,
    /// `"PRIMARY KEY"`, `"UNIQUE"` or `"FOREIGN KEY"`
    pub constraint_type: String,
    pub constraint_name: String,
    pub column_name: String,
    /// Referenced schema (foreign keys only)
    pub ref_schema: Option<String>,
    /// Referenced table (foreign keys only)
    pub ref_table: Option<String>,
    /// Referenced column (foreign keys only, when known)
    pub ref_column: Option<String>,
}

#[async_trait]
pub trait ObjectReader: Send {
    async fn next_object(&mut self) -> Result<Option<ObjectRow>>;
}

#[async_trait]
pub trait ColumnReader: Send {
    async fn next_column(&mut self) -> Result<Option<ColumnRow>>;
}

#[async_trait]
pub trait IndexReader: Send {
    async fn next_index(&mut self) -> Result<Option<IndexRow>>;
}

#[async_trait]
pub trait IndexColumnReader: Send {
    async fn next_index_column(&mut self) -> Result<Option<IndexColumnRow>>;
}

#[async_trait]
pub trait ConstraintReader: Send {
    async fn next_constraint(&mut self) -> Result<Option<ConstraintRow>>;
}

/// Dialect plugin the scanner reads catalog metadata through.
///
/// # Concurrency
/// The scanner opens several readers at once and drives them concurrently,
/// so implementations must tolerate concurrent queries (a pool, not a
/// single connection).
///
/// # Object Safety
/// This trait is object-safe and is normally used as
/// `Box<dyn SchemaProvider>` handed out by the
/// [`ProviderRegistry`](registry::ProviderRegistry).
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Returns the database type this provider handles.
    fn database_type(&self) -> DatabaseType;

    /// Whether readers can be opened with [`Scope::Catalog`].
    ///
    /// Non-bulk providers are scanned one table at a time.
    fn is_bulk_provider(&self) -> bool;

    /// Opens the tables and views of a catalog.
    ///
    /// # Errors
    /// Returns error if the metadata query fails
    async fn objects(&self, catalog: &str) -> Result<Box<dyn ObjectReader>>;

    /// Opens the columns stream.
    async fn columns(&self, scope: Scope<'_>) -> Result<Box<dyn ColumnReader>>;

    /// Opens the indexes stream.
    async fn indexes(&self, scope: Scope<'_>) -> Result<Box<dyn IndexReader>>;

    /// Opens the key and included columns of one index.
    async fn index_columns(
        &self,
        table: &TableKey,
        index_name: &str,
    ) -> Result<Box<dyn IndexColumnReader>>;

    /// Opens the primary key, unique and foreign key constraint stream.
    async fn constraints(&self, scope: Scope<'_>) -> Result<Box<dyn ConstraintReader>>;
}

/// Reader over rows fetched up front.
///
/// Both bundled providers materialize each metadata query before handing
/// out a reader; the result sets are small and this keeps pooled
/// connections checked out only for the duration of the query.
#[derive(Debug)]
pub struct BufferedRows<T> {
    rows: std::vec::IntoIter<T>,
}

impl<T> BufferedRows<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// Number of rows not yet read
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    fn pop(&mut self) -> Option<T> {
        self.rows.next()
    }
}

impl<T> From<Vec<T>> for BufferedRows<T> {
    fn from(rows: Vec<T>) -> Self {
        Self::new(rows)
    }
}

macro_rules! impl_buffered_reader {
    ($reader:ident, $method:ident, $row:ty) => {
        #[async_trait]
        impl $reader for BufferedRows<$row> {
            async fn $method(&mut self) -> Result<Option<$row>> {
                Ok(self.pop())
            }
        }
    };
}

impl_buffered_reader!(ObjectReader, next_object, ObjectRow);
impl_buffered_reader!(ColumnReader, next_column, ColumnRow);
impl_buffered_reader!(IndexReader, next_index, IndexRow);
impl_buffered_reader!(IndexColumnReader, next_index_column, IndexColumnRow);
impl_buffered_reader!(ConstraintReader, next_constraint, ConstraintRow);

// Shared helper utilities
#[cfg(feature = "sqlite")]
pub mod helpers;

// Dialect providers
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mssql")]
pub mod mssql;
