//! The catalog under construction.
//!
//! During a scan each table sits behind its own lock so the three sub-scans
//! can write concurrently. [`ScanTree::finalize`] dissolves the locks and
//! yields an owned [`Catalog`].

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::Result;
use crate::error::ScanError;
use crate::models::{Catalog, DbType, Schema, Table, TableKey};
use crate::providers::ObjectRow;

/// One table or view, locked independently of the others
#[derive(Debug)]
pub struct TableSlot {
    pub key: TableKey,
    pub table: Mutex<Table>,
}

#[derive(Debug)]
struct SchemaSkeleton {
    id: String,
    tables: Vec<usize>,
    views: Vec<usize>,
}

/// Table skeletons in provider order plus the schema layout they belong to
#[derive(Debug)]
pub struct ScanTree {
    catalog: String,
    slots: Vec<TableSlot>,
    schemas: Vec<SchemaSkeleton>,
    seen: HashSet<TableKey>,
}

impl ScanTree {
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            slots: Vec::new(),
            schemas: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Skeletons in the order the objects stream delivered them
    pub fn slots(&self) -> &[TableSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Adds a skeleton for an objects row, creating its schema on first use.
    ///
    /// # Errors
    /// `Integrity` for an unknown object type or a key seen before
    pub fn add_object(&mut self, row: ObjectRow) -> Result<()> {
        let db_type = DbType::parse(&row.db_type).ok_or_else(|| {
            ScanError::integrity(format!(
                "Object {}.{} has unknown type '{}'",
                row.schema, row.name, row.db_type
            ))
        })?;

        let key = TableKey::new(self.catalog.as_str(), row.schema, row.name);
        if !self.seen.insert(key.clone()) {
            return Err(ScanError::integrity(format!(
                "Table {} reported more than once",
                key
            )));
        }

        let slot = self.slots.len();
        let schema = match self.schemas.iter().position(|s| s.id == key.schema) {
            Some(pos) => &mut self.schemas[pos],
            None => {
                self.schemas.push(SchemaSkeleton {
                    id: key.schema.clone(),
                    tables: Vec::new(),
                    views: Vec::new(),
                });
                let last = self.schemas.len() - 1;
                &mut self.schemas[last]
            }
        };
        match db_type {
            DbType::BaseTable => schema.tables.push(slot),
            DbType::View => schema.views.push(slot),
        }

        self.slots.push(TableSlot {
            table: Mutex::new(Table::new(key.clone(), db_type)),
            key,
        });
        Ok(())
    }

    /// Consumes the tree, releasing the per-table locks.
    pub fn finalize(self) -> Catalog {
        let mut tables: Vec<Option<Table>> = self
            .slots
            .into_iter()
            .map(|slot| Some(slot.table.into_inner()))
            .collect();

        let mut catalog = Catalog::new(self.catalog);
        for skeleton in self.schemas {
            let mut schema = Schema::new(skeleton.id);
            schema.tables = skeleton
                .tables
                .iter()
                .filter_map(|&i| tables[i].take())
                .collect();
            schema.views = skeleton
                .views
                .iter()
                .filter_map(|&i| tables[i].take())
                .collect();
            catalog.schemas.push(schema);
        }
        catalog
    }
}
