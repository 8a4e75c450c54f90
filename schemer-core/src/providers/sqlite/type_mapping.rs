//! SQLite declared types to [`UnifiedDataType`].
//!
//! SQLite columns carry a declared type string rather than a real type.
//! Well-known names are mapped directly; everything else falls back to the
//! affinity rules SQLite itself applies:
//! 1. Contains "INT" -> INTEGER affinity
//! 2. Contains "CHAR", "CLOB", or "TEXT" -> TEXT affinity
//! 3. Contains "BLOB" or empty -> BLOB affinity
//! 4. Contains "REAL", "FLOA", or "DOUB" -> REAL affinity
//! 5. Otherwise -> NUMERIC affinity

use crate::models::UnifiedDataType;

/// Maps a SQLite declared type to the unified data type system.
///
/// # Example
/// ```rust
/// use schemer_core::providers::sqlite::map_sqlite_type;
/// use schemer_core::models::UnifiedDataType;
///
/// let unified = map_sqlite_type("VARCHAR(255)");
/// assert_eq!(unified, UnifiedDataType::String { max_length: Some(255) });
/// ```
pub fn map_sqlite_type(declared: &str) -> UnifiedDataType {
    let upper = declared.trim().to_uppercase();
    if upper.is_empty() {
        return UnifiedDataType::Binary { max_length: None };
    }

    let (base, params) = split_type_params(&upper);
    let length = params.first().copied();

    match base {
        "BOOLEAN" | "BOOL" => return UnifiedDataType::Boolean,
        "DATE" => return UnifiedDataType::Date,
        "TIME" => {
            return UnifiedDataType::Time {
                with_timezone: false,
            };
        }
        "DATETIME" | "TIMESTAMP" => {
            return UnifiedDataType::DateTime {
                with_timezone: false,
            };
        }
        "JSON" | "JSONB" => return UnifiedDataType::Json,
        "UUID" | "GUID" => return UnifiedDataType::Uuid,
        "BINARY" | "VARBINARY" => return UnifiedDataType::Binary { max_length: length },
        "FLOAT" => return UnifiedDataType::Float { precision: Some(24) },
        "DECIMAL" | "NUMERIC" | "NUMBER" => {
            return UnifiedDataType::Decimal {
                precision: length.and_then(|p| u8::try_from(p).ok()),
                scale: params.get(1).and_then(|s| u8::try_from(*s).ok()),
            };
        }
        _ => {}
    }

    if base.contains("INT") {
        return integer_width(base);
    }
    if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") {
        return UnifiedDataType::String { max_length: length };
    }
    if base.contains("BLOB") {
        return UnifiedDataType::Binary { max_length: length };
    }
    if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") {
        return UnifiedDataType::Float { precision: Some(53) };
    }
    if base.contains("NUM") || base.contains("DEC") {
        return UnifiedDataType::Decimal {
            precision: None,
            scale: None,
        };
    }

    UnifiedDataType::Custom {
        type_name: declared.to_string(),
    }
}

/// Picks a bit width from integer type hints.
///
/// SQLite stores every integer in up to 64 bits; the declared name is only
/// a hint.
fn integer_width(base: &str) -> UnifiedDataType {
    let bits = match base {
        "TINYINT" => 8,
        "SMALLINT" | "INT2" => 16,
        "MEDIUMINT" | "INT3" => 24,
        "INT" | "INTEGER" | "INT4" => 32,
        _ => 64,
    };
    UnifiedDataType::Integer { bits, signed: true }
}

/// Splits `"DECIMAL(10, 2)"` into `("DECIMAL", [10, 2])`.
///
/// Parameters that are not plain integers are dropped.
pub(crate) fn split_type_params(type_str: &str) -> (&str, Vec<u32>) {
    let Some(open) = type_str.find('(') else {
        return (type_str.trim(), Vec::new());
    };

    let base = type_str[..open].trim();
    let inner = &type_str[open + 1..];
    let inner = inner.split(')').next().unwrap_or(inner);
    let params = inner
        .split(',')
        .filter_map(|p| p.trim().parse::<u32>().ok())
        .collect();

    (base, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_integer_widths() {
        let cases = [
            ("INTEGER", 32),
            ("INT", 32),
            ("TINYINT", 8),
            ("SMALLINT", 16),
            ("MEDIUMINT", 24),
            ("BIGINT", 64),
            ("UNSIGNED BIG INT", 64),
        ];
        for (declared, bits) in cases {
            assert_eq!(
                map_sqlite_type(declared),
                UnifiedDataType::Integer { bits, signed: true },
                "declared type {}",
                declared
            );
        }
    }

    #[test]
    fn test_map_text_affinity() {
        assert_eq!(
            map_sqlite_type("TEXT"),
            UnifiedDataType::String { max_length: None }
        );
        assert_eq!(
            map_sqlite_type("NVARCHAR(100)"),
            UnifiedDataType::String {
                max_length: Some(100)
            }
        );
        assert_eq!(
            map_sqlite_type("clob"),
            UnifiedDataType::String { max_length: None }
        );
    }

    #[test]
    fn test_map_real_and_blob_affinity() {
        assert_eq!(
            map_sqlite_type("DOUBLE PRECISION"),
            UnifiedDataType::Float {
                precision: Some(53)
            }
        );
        assert_eq!(
            map_sqlite_type("FLOAT"),
            UnifiedDataType::Float {
                precision: Some(24)
            }
        );
        assert_eq!(
            map_sqlite_type(""),
            UnifiedDataType::Binary { max_length: None }
        );
        assert_eq!(
            map_sqlite_type("BINARY(16)"),
            UnifiedDataType::Binary {
                max_length: Some(16)
            }
        );
    }

    #[test]
    fn test_map_decimal_keeps_precision_and_scale() {
        assert_eq!(
            map_sqlite_type("DECIMAL(10, 2)"),
            UnifiedDataType::Decimal {
                precision: Some(10),
                scale: Some(2)
            }
        );
        assert_eq!(
            map_sqlite_type("NUMERIC"),
            UnifiedDataType::Decimal {
                precision: None,
                scale: None
            }
        );
    }

    #[test]
    fn test_map_named_types() {
        assert_eq!(map_sqlite_type("bool"), UnifiedDataType::Boolean);
        assert_eq!(map_sqlite_type("DATE"), UnifiedDataType::Date);
        assert_eq!(
            map_sqlite_type("timestamp"),
            UnifiedDataType::DateTime {
                with_timezone: false
            }
        );
        assert_eq!(map_sqlite_type("JSON"), UnifiedDataType::Json);
        assert_eq!(map_sqlite_type("GUID"), UnifiedDataType::Uuid);
    }

    #[test]
    fn test_map_unknown_type_keeps_declared_name() {
        assert_eq!(
            map_sqlite_type("Geometry"),
            UnifiedDataType::Custom {
                type_name: "Geometry".to_string()
            }
        );
    }

    #[test]
    fn test_split_type_params() {
        assert_eq!(split_type_params("VARCHAR(255)"), ("VARCHAR", vec![255]));
        assert_eq!(split_type_params("INTEGER"), ("INTEGER", vec![]));
        assert_eq!(split_type_params("DECIMAL(10,2)"), ("DECIMAL", vec![10, 2]));
        assert_eq!(split_type_params("VARCHAR(MAX)"), ("VARCHAR", vec![]));
    }
}
