//! Constraints sub-scan.
//!
//! Rows of one constraint arrive as an adjacent run, so each row either
//! extends the most recent key of its kind on the table or starts a new one.
//! Writes `primary_key`, `unique_keys` and `foreign_keys` on the owning
//! table and `referenced_by` on the table a foreign key points at. At most
//! one table lock is held at a time, self-references included.

use super::context::ScanContext;
use super::matcher::{SequentialMatcher, find_table};
use super::tree::{ScanTree, TableSlot};
use super::{scan_units, unmatched};
use crate::Result;
use crate::error::ScanError;
use crate::models::{ForeignKey, RefByForeignKey, ReferencedBy, Table, TableKey, UniqueKey};
use crate::providers::{ConstraintRow, SchemaProvider};

const PHASE: &str = "constraints";

pub(super) async fn scan_constraints(
    ctx: &ScanContext,
    provider: &dyn SchemaProvider,
    tree: &ScanTree,
) -> Result<()> {
    let mut count = 0usize;

    for (scope, slots) in scan_units(provider, tree) {
        ctx.check(PHASE)?;
        let mut reader = provider.constraints(scope).await?;
        let mut matcher = SequentialMatcher::new(slots);

        loop {
            ctx.check(PHASE)?;
            let Some(row) = reader.next_constraint().await? else {
                break;
            };

            let slot = matcher
                .sequential_find(tree.catalog(), &row.schema, &row.table)
                .ok_or_else(|| {
                    unmatched(
                        "Constraint",
                        &row.constraint_name,
                        tree.catalog(),
                        &row.schema,
                        &row.table,
                    )
                })?;
            if process_constraint(tree, slot, row).await? {
                count += 1;
            }
        }
    }

    tracing::debug!(
        "Classified {} constraint columns in catalog '{}'",
        count,
        tree.catalog()
    );
    Ok(())
}

/// Applies one constraint row. Returns `false` for skipped constraint types.
async fn process_constraint(tree: &ScanTree, slot: &TableSlot, row: ConstraintRow) -> Result<bool> {
    match row.constraint_type.as_str() {
        "PRIMARY KEY" => {
            let mut table = slot.table.lock().await;
            add_primary_key_column(&mut table, row.constraint_name, row.column_name)?;
        }
        "UNIQUE" => {
            let mut table = slot.table.lock().await;
            add_key_column(&mut table.unique_keys, row.constraint_name, row.column_name);
        }
        "FOREIGN KEY" => add_foreign_key_column(tree, slot, row).await?,
        other => {
            tracing::debug!(
                "Skipping {} constraint '{}' on {}",
                other,
                row.constraint_name,
                slot.key
            );
            return Ok(false);
        }
    }
    Ok(true)
}

fn add_primary_key_column(table: &mut Table, name: String, column: String) -> Result<()> {
    match &mut table.primary_key {
        Some(pk) if pk.name == name => pk.columns.push(column),
        Some(pk) => {
            return Err(ScanError::integrity(format!(
                "Table {} has primary keys '{}' and '{}'",
                table.key, pk.name, name
            )));
        }
        None => {
            table.primary_key = Some(UniqueKey {
                name,
                columns: vec![column],
            });
        }
    }
    Ok(())
}

fn add_key_column(keys: &mut Vec<UniqueKey>, name: String, column: String) {
    match keys.last_mut() {
        Some(key) if key.name == name => key.columns.push(column),
        _ => keys.push(UniqueKey {
            name,
            columns: vec![column],
        }),
    }
}

async fn add_foreign_key_column(tree: &ScanTree, slot: &TableSlot, row: ConstraintRow) -> Result<()> {
    let ConstraintRow {
        schema,
        constraint_name,
        column_name,
        ref_schema,
        ref_table,
        ref_column,
        ..
    } = row;

    let Some(ref_table) = ref_table.filter(|name| !name.is_empty()) else {
        return Err(ScanError::integrity(format!(
            "Foreign key '{}' on {} has no referenced table",
            constraint_name, slot.key
        )));
    };
    let ref_schema = ref_schema.unwrap_or(schema);

    let target = find_table(tree.slots(), tree.catalog(), &ref_schema, &ref_table).ok_or_else(|| {
        ScanError::integrity(format!(
            "Foreign key '{}' on {} references missing table {}",
            constraint_name,
            slot.key,
            TableKey::new(tree.catalog(), ref_schema.as_str(), ref_table.as_str())
        ))
    })?;

    {
        let mut table = slot.table.lock().await;
        match table.foreign_keys.last_mut() {
            Some(fk) if fk.name == constraint_name => {
                fk.columns.push(column_name.clone());
                fk.ref_columns.extend(ref_column);
            }
            _ => table.foreign_keys.push(ForeignKey {
                name: constraint_name.clone(),
                columns: vec![column_name.clone()],
                ref_table: target.key.clone(),
                ref_columns: ref_column.into_iter().collect(),
            }),
        }
    }

    let mut referenced = target.table.lock().await;
    add_back_reference(&mut referenced, &slot.key, constraint_name, column_name);
    Ok(())
}

/// Finds or creates the entry for `referencing`, then the named key in it.
fn add_back_reference(referenced: &mut Table, referencing: &TableKey, name: String, column: String) {
    let entry = match referenced
        .referenced_by
        .iter()
        .position(|r| &r.table_key == referencing)
    {
        Some(pos) => &mut referenced.referenced_by[pos],
        None => {
            referenced.referenced_by.push(ReferencedBy {
                table_key: referencing.clone(),
                foreign_keys: Vec::new(),
            });
            let last = referenced.referenced_by.len() - 1;
            &mut referenced.referenced_by[last]
        }
    };

    match entry.foreign_keys.iter_mut().find(|fk| fk.name == name) {
        Some(fk) => fk.columns.push(column),
        None => entry.foreign_keys.push(RefByForeignKey {
            name,
            columns: vec![column],
        }),
    }
}
