//! Helper utilities for provider implementations.

use crate::{Result, error::ScanError};
use sqlx::{Row, sqlite::SqliteRow};

/// Extension trait for extracting typed values from metadata rows
/// with consistent error handling.
///
/// # Example
/// ```rust,ignore
/// use schemer_core::providers::helpers::RowExt;
///
/// let name: String = row.get_field("name", Some("pragma_table_info"))?;
/// let default: Option<String> = row.get_field("dflt_value", None)?;
/// ```
pub trait RowExt {
    /// Extracts a typed field from the row with proper error context.
    ///
    /// # Arguments
    /// * `field_name` - Name of the column to extract
    /// * `query_context` - Optional query description for error messages
    fn get_field<'r, T>(&'r self, field_name: &str, query_context: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>;
}

impl RowExt for SqliteRow {
    fn get_field<'r, T>(&'r self, field_name: &str, query_context: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
    {
        self.try_get(field_name)
            .map_err(|e| ScanError::parse_field(field_name, query_context, e))
    }
}

/// Wraps a failed metadata query into a provider error.
pub(crate) fn query_failed(resource: &str, error: sqlx::Error) -> ScanError {
    ScanError::provider_failed(format!("Failed to query {}", resource), error)
}
