//! Columns sub-scan: writes `Table::columns`.

use super::context::ScanContext;
use super::matcher::SequentialMatcher;
use super::tree::ScanTree;
use super::{scan_units, unmatched};
use crate::Result;
use crate::models::Column;
use crate::providers::{ColumnRow, SchemaProvider};

const PHASE: &str = "columns";

impl From<ColumnRow> for Column {
    fn from(row: ColumnRow) -> Self {
        Self {
            name: row.name,
            ordinal_position: row.ordinal,
            data_type: row.data_type,
            unified_type: row.unified_type,
            max_length: row.max_length,
            precision: row.precision,
            scale: row.scale,
            is_nullable: row.is_nullable,
            is_identity: row.is_identity,
            default_value: row.default_value,
        }
    }
}

pub(super) async fn scan_columns(
    ctx: &ScanContext,
    provider: &dyn SchemaProvider,
    tree: &ScanTree,
) -> Result<()> {
    let mut count = 0usize;

    for (scope, slots) in scan_units(provider, tree) {
        ctx.check(PHASE)?;
        let mut reader = provider.columns(scope).await?;
        let mut matcher = SequentialMatcher::new(slots);

        loop {
            ctx.check(PHASE)?;
            let Some(row) = reader.next_column().await? else {
                break;
            };

            let slot = matcher
                .sequential_find(tree.catalog(), &row.schema, &row.table)
                .ok_or_else(|| unmatched("Column", &row.name, tree.catalog(), &row.schema, &row.table))?;
            slot.table.lock().await.columns.push(Column::from(row));
            count += 1;
        }
    }

    tracing::debug!("Attached {} columns in catalog '{}'", count, tree.catalog());
    Ok(())
}
