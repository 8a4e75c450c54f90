//! Database catalog scanning for schemer.
//!
//! This crate reads catalog metadata (tables, views, columns, indexes and key
//! constraints) through pluggable dialect providers and assembles it into an
//! owned, validated [`Catalog`] tree.
//!
//! # Security Guarantees
//! - All database operations are read-only catalog queries
//! - Connection strings reach logs and errors only in redacted form
//! - Passwords are zeroized after building driver configuration
//!
//! # Architecture
//! - `providers`: the [`SchemaProvider`] SPI, its SQLite and SQL Server
//!   implementations and a driver registry
//! - `scanner`: the orchestrator joining provider streams onto the catalog
//! - `models`: the catalog tree, serializable with serde
//! - `validation`: structural invariants checked on the assembled catalog

pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod scanner;
pub mod validation;

// Re-export commonly used types
pub use error::{Result, ScanError, redact_database_url};
pub use models::{
    Catalog, Column, DatabaseType, DbType, ForeignKey, Index, IndexColumn, RefByForeignKey,
    ReferencedBy, Schema, SortOrder, Table, TableKey, UnifiedDataType, UniqueKey,
};
pub use providers::{
    ConnectionConfig, ProviderFactory, ProviderRegistry, SchemaProvider, Scope, detect_driver,
};
pub use scanner::{ScanConfig, ScanContext, Scanner};
pub use validation::ValidationError;
