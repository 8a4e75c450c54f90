//! Metadata queries against `sqlite_master` and the table-valued pragmas.
//!
//! Every query is ordered server-side. SQLite does not name primary key or
//! foreign key constraints, so names are synthesized as `pk_<table>` and
//! `fk_<table>_<id>` where `id` is the pragma's foreign key id.

use super::type_mapping::map_sqlite_type;
use crate::Result;
use crate::providers::helpers::{RowExt, query_failed};
use crate::providers::{ColumnRow, ConstraintRow, IndexColumnRow, IndexRow, ObjectRow};
use sqlx::SqlitePool;

const OBJECTS_SQL: &str = r#"
    SELECT name,
           CASE type WHEN 'table' THEN 'BASE TABLE' ELSE 'VIEW' END AS table_type
    FROM sqlite_master
    WHERE type IN ('table', 'view')
      AND substr(name, 1, 7) <> 'sqlite_'
    ORDER BY name
"#;

const COLUMNS_SQL: &str = r#"
    SELECT cid,
           name,
           type,
           "notnull" AS not_null,
           dflt_value,
           pk,
           (SELECT COUNT(*) FROM pragma_table_info(?1) WHERE pk > 0) AS pk_count
    FROM pragma_table_info(?1)
    ORDER BY cid
"#;

const INDEXES_SQL: &str = r#"
    SELECT name, "unique" AS is_unique, origin
    FROM pragma_index_list(?1)
    ORDER BY name
"#;

const INDEX_COLUMNS_SQL: &str = r#"
    SELECT seqno, name, "desc" AS is_desc
    FROM pragma_index_xinfo(?1)
    WHERE key = 1 AND name IS NOT NULL
    ORDER BY seqno
"#;

const CONSTRAINTS_SQL: &str = r#"
    SELECT 'PRIMARY KEY' AS constraint_type,
           'pk_' || ?1 AS constraint_name,
           name AS column_name,
           NULL AS ref_table,
           NULL AS ref_column,
           pk AS position
    FROM pragma_table_info(?1)
    WHERE pk > 0
    UNION ALL
    SELECT 'UNIQUE', il.name, ii.name, NULL, NULL, ii.seqno
    FROM pragma_index_list(?1) AS il, pragma_index_info(il.name) AS ii
    WHERE il.origin = 'u'
    UNION ALL
    SELECT 'FOREIGN KEY', 'fk_' || ?1 || '_' || fk.id, fk."from", fk."table", fk."to", fk.seq
    FROM pragma_foreign_key_list(?1) AS fk
    ORDER BY constraint_type, constraint_name, position
"#;

pub(super) async fn fetch_objects(pool: &SqlitePool) -> Result<Vec<ObjectRow>> {
    let rows = sqlx::query(OBJECTS_SQL)
        .fetch_all(pool)
        .await
        .map_err(|e| query_failed("sqlite_master", e))?;

    rows.iter()
        .map(|row| {
            Ok(ObjectRow {
                schema: String::new(),
                name: row.get_field("name", Some("sqlite_master"))?,
                db_type: row.get_field("table_type", Some("sqlite_master"))?,
            })
        })
        .collect()
}

pub(super) async fn fetch_columns(pool: &SqlitePool, table: &str) -> Result<Vec<ColumnRow>> {
    const CONTEXT: Option<&str> = Some("pragma_table_info");

    let rows = sqlx::query(COLUMNS_SQL)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| query_failed("pragma_table_info", e))?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let cid: i64 = row.get_field("cid", CONTEXT)?;
        let data_type: String = row.get_field("type", CONTEXT)?;
        let not_null: i64 = row.get_field("not_null", CONTEXT)?;
        let pk: i64 = row.get_field("pk", CONTEXT)?;
        let pk_count: i64 = row.get_field("pk_count", CONTEXT)?;

        let unified_type = map_sqlite_type(&data_type);
        let (max_length, precision, scale) = unified_type.facets();
        // INTEGER PRIMARY KEY aliases the rowid
        let is_identity = pk == 1 && pk_count == 1 && data_type.eq_ignore_ascii_case("INTEGER");

        columns.push(ColumnRow {
            schema: String::new(),
            table: table.to_string(),
            name: row.get_field("name", CONTEXT)?,
            ordinal: u32::try_from(cid + 1).unwrap_or(u32::MAX),
            data_type,
            unified_type,
            max_length,
            precision,
            scale,
            // PRIMARY KEY does not imply NOT NULL in SQLite, except for the rowid alias
            is_nullable: not_null == 0 && !is_identity,
            is_identity,
            default_value: row.get_field("dflt_value", CONTEXT)?,
        });
    }
    Ok(columns)
}

pub(super) async fn fetch_indexes(pool: &SqlitePool, table: &str) -> Result<Vec<IndexRow>> {
    const CONTEXT: Option<&str> = Some("pragma_index_list");

    let rows = sqlx::query(INDEXES_SQL)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| query_failed("pragma_index_list", e))?;

    rows.iter()
        .map(|row| {
            let is_unique: i64 = row.get_field("is_unique", CONTEXT)?;
            let origin: String = row.get_field("origin", CONTEXT)?;
            Ok(IndexRow {
                schema: String::new(),
                table: table.to_string(),
                name: row.get_field("name", CONTEXT)?,
                is_unique: is_unique != 0,
                is_primary: origin == "pk",
                index_type: Some("btree".to_string()),
            })
        })
        .collect()
}

pub(super) async fn fetch_index_columns(
    pool: &SqlitePool,
    index_name: &str,
) -> Result<Vec<IndexColumnRow>> {
    const CONTEXT: Option<&str> = Some("pragma_index_xinfo");

    let rows = sqlx::query(INDEX_COLUMNS_SQL)
        .bind(index_name)
        .fetch_all(pool)
        .await
        .map_err(|e| query_failed("pragma_index_xinfo", e))?;

    rows.iter()
        .map(|row| {
            let seqno: i64 = row.get_field("seqno", CONTEXT)?;
            let is_desc: i64 = row.get_field("is_desc", CONTEXT)?;
            Ok(IndexColumnRow {
                name: row.get_field("name", CONTEXT)?,
                ordinal: u32::try_from(seqno + 1).unwrap_or(u32::MAX),
                is_descending: is_desc != 0,
                is_included: false,
            })
        })
        .collect()
}

pub(super) async fn fetch_constraints(
    pool: &SqlitePool,
    table: &str,
) -> Result<Vec<ConstraintRow>> {
    const CONTEXT: Option<&str> = Some("table constraints");

    let rows = sqlx::query(CONSTRAINTS_SQL)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| query_failed("pragma_foreign_key_list", e))?;

    rows.iter()
        .map(|row| {
            let ref_table: Option<String> = row.get_field("ref_table", CONTEXT)?;
            Ok(ConstraintRow {
                schema: String::new(),
                table: table.to_string(),
                constraint_type: row.get_field("constraint_type", CONTEXT)?,
                constraint_name: row.get_field("constraint_name", CONTEXT)?,
                column_name: row.get_field("column_name", CONTEXT)?,
                ref_schema: ref_table.as_ref().map(|_| String::new()),
                ref_table,
                ref_column: row.get_field("ref_column", CONTEXT)?,
            })
        })
        .collect()
}
