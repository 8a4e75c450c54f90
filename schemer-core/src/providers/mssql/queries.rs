//! Catalog queries against the SQL Server `sys.*` views.
//!
//! All views are addressed with three-part names (`[catalog].sys.objects`)
//! so one pooled connection can read any catalog on the server. Only user
//! tables and views (`type IN ('U', 'V')`, `is_ms_shipped = 0`) are read.
//! Table-scoped queries filter on `@P1` (schema) and `@P2` (table).

use super::type_mapping::map_mssql_type;
use crate::Result;
use crate::error::ScanError;
use crate::models::TableKey;
use crate::providers::{ColumnRow, ConstraintRow, IndexColumnRow, IndexRow, ObjectRow, Scope};
use tiberius::{Client, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

pub(super) type MssqlClient = Client<Compat<TcpStream>>;

/// Bracket-quotes an identifier, doubling any closing bracket.
pub fn quote_name(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Filter appended to table-scoped queries
fn table_filter(scope: Scope<'_>) -> &'static str {
    match scope {
        Scope::Catalog(_) => "",
        Scope::Table(_) => "AND s.name = @P1 AND o.name = @P2",
    }
}

pub(super) fn objects_sql(catalog: &str) -> String {
    let db = quote_name(catalog);
    format!(
        r#"
        SELECT s.name AS schema_name,
               o.name AS table_name,
               CASE o.type WHEN 'U' THEN 'BASE TABLE' ELSE 'VIEW' END AS table_type
        FROM {db}.sys.objects AS o
        JOIN {db}.sys.schemas AS s ON s.schema_id = o.schema_id
        WHERE o.type IN ('U', 'V') AND o.is_ms_shipped = 0
        ORDER BY s.name, o.name
        "#
    )
}

pub(super) fn columns_sql(scope: Scope<'_>) -> String {
    let db = quote_name(scope.catalog());
    let filter = table_filter(scope);
    format!(
        r#"
        SELECT s.name AS schema_name,
               o.name AS table_name,
               c.name AS column_name,
               CAST(c.column_id AS INT) AS ordinal,
               t.name AS type_name,
               CAST(c.max_length AS INT) AS max_length,
               CAST(c.precision AS INT) AS precision,
               CAST(c.scale AS INT) AS scale,
               CAST(c.is_nullable AS INT) AS is_nullable,
               CAST(c.is_identity AS INT) AS is_identity,
               dc.definition AS default_value
        FROM {db}.sys.columns AS c
        JOIN {db}.sys.objects AS o ON o.object_id = c.object_id
        JOIN {db}.sys.schemas AS s ON s.schema_id = o.schema_id
        JOIN {db}.sys.types AS t ON t.user_type_id = c.user_type_id
        LEFT JOIN {db}.sys.default_constraints AS dc ON dc.object_id = c.default_object_id
        WHERE o.type IN ('U', 'V') AND o.is_ms_shipped = 0 {filter}
        ORDER BY s.name, o.name, c.column_id
        "#
    )
}

pub(super) fn indexes_sql(scope: Scope<'_>) -> String {
    let db = quote_name(scope.catalog());
    let filter = table_filter(scope);
    format!(
        r#"
        SELECT s.name AS schema_name,
               o.name AS table_name,
               i.name AS index_name,
               CAST(i.is_unique AS INT) AS is_unique,
               CAST(i.is_primary_key AS INT) AS is_primary,
               i.type_desc AS index_type
        FROM {db}.sys.indexes AS i
        JOIN {db}.sys.objects AS o ON o.object_id = i.object_id
        JOIN {db}.sys.schemas AS s ON s.schema_id = o.schema_id
        WHERE o.type IN ('U', 'V') AND o.is_ms_shipped = 0
          AND i.type > 0 AND i.is_hypothetical = 0 {filter}
        ORDER BY s.name, o.name, i.name
        "#
    )
}

pub(super) fn index_columns_sql(catalog: &str) -> String {
    let db = quote_name(catalog);
    format!(
        r#"
        SELECT c.name AS column_name,
               CAST(ic.is_descending_key AS INT) AS is_descending,
               CAST(ic.is_included_column AS INT) AS is_included
        FROM {db}.sys.index_columns AS ic
        JOIN {db}.sys.indexes AS i ON i.object_id = ic.object_id AND i.index_id = ic.index_id
        JOIN {db}.sys.columns AS c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        JOIN {db}.sys.objects AS o ON o.object_id = i.object_id
        JOIN {db}.sys.schemas AS s ON s.schema_id = o.schema_id
        WHERE s.name = @P1 AND o.name = @P2 AND i.name = @P3
        ORDER BY ic.is_included_column, ic.key_ordinal, ic.index_column_id
        "#
    )
}

pub(super) fn constraints_sql(scope: Scope<'_>) -> String {
    let db = quote_name(scope.catalog());
    let filter = table_filter(scope);
    format!(
        r#"
        SELECT s.name AS schema_name,
               o.name AS table_name,
               CASE kc.type WHEN 'PK' THEN 'PRIMARY KEY' ELSE 'UNIQUE' END AS constraint_type,
               kc.name AS constraint_name,
               c.name AS column_name,
               CAST(NULL AS sysname) AS ref_schema,
               CAST(NULL AS sysname) AS ref_table,
               CAST(NULL AS sysname) AS ref_column,
               CAST(ic.key_ordinal AS INT) AS position
        FROM {db}.sys.key_constraints AS kc
        JOIN {db}.sys.objects AS o ON o.object_id = kc.parent_object_id
        JOIN {db}.sys.schemas AS s ON s.schema_id = o.schema_id
        JOIN {db}.sys.index_columns AS ic
          ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id
        JOIN {db}.sys.columns AS c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        WHERE o.is_ms_shipped = 0 AND ic.is_included_column = 0 {filter}
        UNION ALL
        SELECT s.name,
               o.name,
               'FOREIGN KEY',
               fk.name,
               pc.name,
               rs.name,
               ro.name,
               rc.name,
               CAST(fkc.constraint_column_id AS INT)
        FROM {db}.sys.foreign_keys AS fk
        JOIN {db}.sys.foreign_key_columns AS fkc ON fkc.constraint_object_id = fk.object_id
        JOIN {db}.sys.objects AS o ON o.object_id = fk.parent_object_id
        JOIN {db}.sys.schemas AS s ON s.schema_id = o.schema_id
        JOIN {db}.sys.columns AS pc
          ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id
        JOIN {db}.sys.objects AS ro ON ro.object_id = fk.referenced_object_id
        JOIN {db}.sys.schemas AS rs ON rs.schema_id = ro.schema_id
        JOIN {db}.sys.columns AS rc
          ON rc.object_id = fkc.referenced_object_id AND rc.column_id = fkc.referenced_column_id
        WHERE o.is_ms_shipped = 0 {filter}
        ORDER BY schema_name, table_name, constraint_type, constraint_name, position
        "#
    )
}

/// Runs a query and buffers its first result set.
pub(super) async fn run(
    client: &mut MssqlClient,
    sql: String,
    params: &[&str],
    resource: &str,
) -> Result<Vec<Row>> {
    let mut query = Query::new(sql);
    for param in params {
        query.bind(param.to_string());
    }

    let stream = query
        .query(client)
        .await
        .map_err(|e| ScanError::provider_failed(format!("Failed to query {}", resource), e))?;
    stream
        .into_first_result()
        .await
        .map_err(|e| ScanError::provider_failed(format!("Failed to read {}", resource), e))
}

/// Positional parameters for a scope (`@P1` schema, `@P2` table)
pub(super) fn scope_params<'a>(scope: Scope<'a>) -> Vec<&'a str> {
    match scope {
        Scope::Catalog(_) => Vec::new(),
        Scope::Table(key) => vec![key.schema.as_str(), key.name.as_str()],
    }
}

fn text(row: &Row, idx: usize, field: &str, context: &str) -> Result<String> {
    optional_text(row, idx, field, context)?.ok_or_else(|| {
        ScanError::integrity(format!("{} returned NULL for '{}'", context, field))
    })
}

fn optional_text(row: &Row, idx: usize, field: &str, context: &str) -> Result<Option<String>> {
    row.try_get::<&str, _>(idx)
        .map(|value| value.map(str::to_string))
        .map_err(|e| ScanError::parse_field(field, Some(context), e))
}

fn int(row: &Row, idx: usize, field: &str, context: &str) -> Result<i32> {
    row.try_get::<i32, _>(idx)
        .map_err(|e| ScanError::parse_field(field, Some(context), e))?
        .ok_or_else(|| ScanError::integrity(format!("{} returned NULL for '{}'", context, field)))
}

fn flag(row: &Row, idx: usize, field: &str, context: &str) -> Result<bool> {
    Ok(int(row, idx, field, context)? != 0)
}

pub(super) fn object_row(row: &Row) -> Result<ObjectRow> {
    const CONTEXT: &str = "sys.objects";
    Ok(ObjectRow {
        schema: text(row, 0, "schema_name", CONTEXT)?,
        name: text(row, 1, "table_name", CONTEXT)?,
        db_type: text(row, 2, "table_type", CONTEXT)?,
    })
}

pub(super) fn column_row(row: &Row) -> Result<ColumnRow> {
    const CONTEXT: &str = "sys.columns";
    let data_type = text(row, 4, "type_name", CONTEXT)?;
    let max_length = int(row, 5, "max_length", CONTEXT)?;
    let precision = u8::try_from(int(row, 6, "precision", CONTEXT)?).unwrap_or(0);
    let scale = u8::try_from(int(row, 7, "scale", CONTEXT)?).unwrap_or(0);

    let unified_type = map_mssql_type(&data_type, max_length, precision, scale);
    let (max_length, precision, scale) = unified_type.facets();

    Ok(ColumnRow {
        schema: text(row, 0, "schema_name", CONTEXT)?,
        table: text(row, 1, "table_name", CONTEXT)?,
        name: text(row, 2, "column_name", CONTEXT)?,
        ordinal: u32::try_from(int(row, 3, "ordinal", CONTEXT)?).unwrap_or(0),
        data_type,
        unified_type,
        max_length,
        precision,
        scale,
        is_nullable: flag(row, 8, "is_nullable", CONTEXT)?,
        is_identity: flag(row, 9, "is_identity", CONTEXT)?,
        default_value: optional_text(row, 10, "default_value", CONTEXT)?,
    })
}

pub(super) fn index_row(row: &Row) -> Result<IndexRow> {
    const CONTEXT: &str = "sys.indexes";
    Ok(IndexRow {
        schema: text(row, 0, "schema_name", CONTEXT)?,
        table: text(row, 1, "table_name", CONTEXT)?,
        name: text(row, 2, "index_name", CONTEXT)?,
        is_unique: flag(row, 3, "is_unique", CONTEXT)?,
        is_primary: flag(row, 4, "is_primary", CONTEXT)?,
        index_type: optional_text(row, 5, "index_type", CONTEXT)?,
    })
}

/// Maps index column rows; ordinals follow result order, key columns first.
pub(super) fn index_column_rows(rows: &[Row]) -> Result<Vec<IndexColumnRow>> {
    const CONTEXT: &str = "sys.index_columns";
    rows.iter()
        .zip(1u32..)
        .map(|(row, ordinal)| {
            Ok(IndexColumnRow {
                name: text(row, 0, "column_name", CONTEXT)?,
                ordinal,
                is_descending: flag(row, 1, "is_descending", CONTEXT)?,
                is_included: flag(row, 2, "is_included", CONTEXT)?,
            })
        })
        .collect()
}

pub(super) fn constraint_row(row: &Row) -> Result<ConstraintRow> {
    const CONTEXT: &str = "sys.key_constraints";
    Ok(ConstraintRow {
        schema: text(row, 0, "schema_name", CONTEXT)?,
        table: text(row, 1, "table_name", CONTEXT)?,
        constraint_type: text(row, 2, "constraint_type", CONTEXT)?,
        constraint_name: text(row, 3, "constraint_name", CONTEXT)?,
        column_name: text(row, 4, "column_name", CONTEXT)?,
        ref_schema: optional_text(row, 5, "ref_schema", CONTEXT)?,
        ref_table: optional_text(row, 6, "ref_table", CONTEXT)?,
        ref_column: optional_text(row, 7, "ref_column", CONTEXT)?,
    })
}

/// Parameters for an index column lookup (`@P1`, `@P2`, `@P3`)
pub(super) fn index_params<'a>(table: &'a TableKey, index_name: &'a str) -> [&'a str; 3] {
    [table.schema.as_str(), table.name.as_str(), index_name]
}
