//! SQL Server types to [`UnifiedDataType`].
//!
//! `sys.columns.max_length` is a byte count (`-1` for `MAX`); Unicode
//! character types use two bytes per character.

use crate::models::UnifiedDataType;

/// Maps a SQL Server system type to the unified data type system.
///
/// # Arguments
/// * `type_name` - Name from `sys.types` (case-insensitive)
/// * `max_length` - Byte length from `sys.columns`, `-1` for `MAX`
/// * `precision` / `scale` - Numeric facets from `sys.columns`
///
/// # Example
/// ```rust
/// use schemer_core::providers::mssql::map_mssql_type;
/// use schemer_core::models::UnifiedDataType;
///
/// let unified = map_mssql_type("nvarchar", 200, 0, 0);
/// assert_eq!(unified, UnifiedDataType::String { max_length: Some(100) });
/// ```
pub fn map_mssql_type(type_name: &str, max_length: i32, precision: u8, scale: u8) -> UnifiedDataType {
    let lower = type_name.to_ascii_lowercase();
    match lower.as_str() {
        "bit" => UnifiedDataType::Boolean,
        "tinyint" => UnifiedDataType::Integer {
            bits: 8,
            signed: false,
        },
        "smallint" => UnifiedDataType::Integer {
            bits: 16,
            signed: true,
        },
        "int" => UnifiedDataType::Integer {
            bits: 32,
            signed: true,
        },
        "bigint" => UnifiedDataType::Integer {
            bits: 64,
            signed: true,
        },
        "decimal" | "numeric" => UnifiedDataType::Decimal {
            precision: Some(precision),
            scale: Some(scale),
        },
        "money" => UnifiedDataType::Decimal {
            precision: Some(19),
            scale: Some(4),
        },
        "smallmoney" => UnifiedDataType::Decimal {
            precision: Some(10),
            scale: Some(4),
        },
        "float" => UnifiedDataType::Float {
            precision: Some(53),
        },
        "real" => UnifiedDataType::Float {
            precision: Some(24),
        },
        "char" | "varchar" | "text" | "nchar" | "nvarchar" | "ntext" | "sysname" => {
            UnifiedDataType::String {
                max_length: char_length(&lower, max_length),
            }
        }
        "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => UnifiedDataType::Binary {
            max_length: byte_length(&lower, max_length),
        },
        "date" => UnifiedDataType::Date,
        "time" => UnifiedDataType::Time {
            with_timezone: false,
        },
        "datetime" | "datetime2" | "smalldatetime" => UnifiedDataType::DateTime {
            with_timezone: false,
        },
        "datetimeoffset" => UnifiedDataType::DateTime {
            with_timezone: true,
        },
        "uniqueidentifier" => UnifiedDataType::Uuid,
        "json" => UnifiedDataType::Json,
        _ => UnifiedDataType::Custom {
            type_name: type_name.to_string(),
        },
    }
}

fn char_length(type_name: &str, max_length: i32) -> Option<u32> {
    if matches!(type_name, "text" | "ntext") {
        return None;
    }
    let bytes = u32::try_from(max_length).ok()?;
    if matches!(type_name, "nchar" | "nvarchar" | "sysname") {
        Some(bytes / 2)
    } else {
        Some(bytes)
    }
}

fn byte_length(type_name: &str, max_length: i32) -> Option<u32> {
    if type_name == "image" {
        return None;
    }
    u32::try_from(max_length).ok()
}
