//! Indexes sub-scan: writes `Table::indexes`.
//!
//! Index rows are joined first; each discovered index then gets its own
//! index-column sub-scan, run through the fan-out executor with a bound on
//! how many readers are open at once.

use super::context::ScanContext;
use super::fanout::fan_out;
use super::matcher::SequentialMatcher;
use super::tree::{ScanTree, TableSlot};
use super::{scan_units, unmatched};
use crate::Result;
use crate::error::ScanError;
use crate::models::{Index, IndexColumn, SortOrder};
use crate::providers::{IndexColumnRow, SchemaProvider};

const PHASE: &str = "indexes";
const COLUMNS_PHASE: &str = "index columns";

impl From<IndexColumnRow> for IndexColumn {
    fn from(row: IndexColumnRow) -> Self {
        Self {
            name: row.name,
            ordinal_position: row.ordinal,
            sort_order: if row.is_descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
            is_included: row.is_included,
        }
    }
}

pub(super) async fn scan_indexes(
    ctx: &ScanContext,
    provider: &dyn SchemaProvider,
    tree: &ScanTree,
    max_concurrency: usize,
) -> Result<()> {
    let mut discovered: Vec<(&TableSlot, String)> = Vec::new();

    for (scope, slots) in scan_units(provider, tree) {
        ctx.check(PHASE)?;
        let mut reader = provider.indexes(scope).await?;
        let mut matcher = SequentialMatcher::new(slots);

        loop {
            ctx.check(PHASE)?;
            let Some(row) = reader.next_index().await? else {
                break;
            };

            let slot = matcher
                .sequential_find(tree.catalog(), &row.schema, &row.table)
                .ok_or_else(|| unmatched("Index", &row.name, tree.catalog(), &row.schema, &row.table))?;
            slot.table.lock().await.indexes.push(Index {
                name: row.name.clone(),
                is_unique: row.is_unique,
                is_primary: row.is_primary,
                index_type: row.index_type,
                columns: Vec::new(),
            });
            discovered.push((slot, row.name));
        }
    }

    tracing::debug!(
        "Found {} indexes in catalog '{}', reading their columns",
        discovered.len(),
        tree.catalog()
    );

    // Collected so no iterator adapter is held across the await
    let scans: Vec<_> = discovered
        .iter()
        .map(|(slot, name)| scan_index_columns(ctx, provider, slot, name))
        .collect();
    fan_out(scans, Some(max_concurrency)).await?;
    Ok(())
}

async fn scan_index_columns(
    ctx: &ScanContext,
    provider: &dyn SchemaProvider,
    slot: &TableSlot,
    index_name: &str,
) -> Result<()> {
    ctx.check(COLUMNS_PHASE)?;

    let mut columns = Vec::new();
    {
        let mut reader = provider.index_columns(&slot.key, index_name).await?;
        loop {
            ctx.check(COLUMNS_PHASE)?;
            let Some(row) = reader.next_index_column().await? else {
                break;
            };
            columns.push(IndexColumn::from(row));
        }
    }

    let mut table = slot.table.lock().await;
    let index = table
        .indexes
        .iter_mut()
        .find(|index| index.name == index_name)
        .ok_or_else(|| {
            ScanError::integrity(format!(
                "Index '{}' not found on {} when attaching its columns",
                index_name, slot.key
            ))
        })?;
    index.columns = columns;
    Ok(())
}
