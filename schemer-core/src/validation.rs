//! Structural validation of an assembled [`Catalog`].
//!
//! `Catalog::validate` checks the invariants the scanner is expected to
//! uphold: naming, key uniqueness, list classification, constraint shape and
//! foreign key / back-reference symmetry in both directions. The first
//! violation found is returned.
//!
//! # Example
//! ```rust
//! use schemer_core::models::{Catalog, DbType, Schema, Table, TableKey};
//!
//! let mut schema = Schema::new("dbo");
//! schema.tables.push(Table::new(
//!     TableKey::new("sales", "dbo", "customers"),
//!     DbType::BaseTable,
//! ));
//! let mut catalog = Catalog::new("sales");
//! catalog.schemas.push(schema);
//!
//! assert!(catalog.validate().is_ok());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::models::{Catalog, DbType, Table, TableKey};

/// Catalog invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Catalog name is empty")]
    EmptyCatalogName,

    #[error("Schema '{id}' appears more than once in catalog")]
    DuplicateSchema { id: String },

    #[error("Schema '{schema}' contains a table with an empty name")]
    EmptyTableName { schema: String },

    #[error("Table {table} is not keyed under catalog '{catalog}', schema '{schema}'")]
    MisplacedTable {
        table: TableKey,
        catalog: String,
        schema: String,
    },

    #[error("Table {table} appears more than once in catalog")]
    DuplicateTable { table: TableKey },

    #[error("Table {table} is classified as {db_type} but listed as {listed_as}")]
    DbTypeMismatch {
        table: TableKey,
        db_type: DbType,
        listed_as: DbType,
    },

    #[error("Table {table} has duplicate column '{column}'")]
    DuplicateColumn { table: TableKey, column: String },

    #[error("Table {table} has a {kind} constraint with an empty name")]
    EmptyConstraintName { table: TableKey, kind: &'static str },

    #[error("Constraint '{name}' on {table} has no columns")]
    EmptyConstraintColumns { table: TableKey, name: String },

    #[error("Foreign key '{name}' on {table} references missing table {ref_table}")]
    DanglingForeignKey {
        table: TableKey,
        name: String,
        ref_table: TableKey,
    },

    #[error("Foreign key '{name}' appears more than once on {table}")]
    DuplicateForeignKey { table: TableKey, name: String },

    #[error("Table {table} lists back-references from {referencing} more than once")]
    DuplicateReferencedBy {
        table: TableKey,
        referencing: TableKey,
    },

    #[error("Back-reference '{name}' from {referencing} appears more than once on {table}")]
    DuplicateBackReference {
        table: TableKey,
        name: String,
        referencing: TableKey,
    },

    #[error("Foreign key '{name}' on {table} has no matching back-reference on {ref_table}")]
    MissingBackReference {
        table: TableKey,
        name: String,
        ref_table: TableKey,
    },

    #[error("Back-reference '{name}' on {table} has no matching foreign key on {referencing}")]
    OrphanBackReference {
        table: TableKey,
        name: String,
        referencing: TableKey,
    },
}

impl Catalog {
    /// Checks the structural invariants of a finished catalog.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyCatalogName);
        }

        let mut schema_ids = HashSet::new();
        let mut table_keys = HashSet::new();

        for schema in &self.schemas {
            if !schema_ids.insert(schema.id.as_str()) {
                return Err(ValidationError::DuplicateSchema {
                    id: schema.id.clone(),
                });
            }

            let listed = schema
                .tables
                .iter()
                .map(|t| (t, DbType::BaseTable))
                .chain(schema.views.iter().map(|t| (t, DbType::View)));

            for (table, listed_as) in listed {
                if table.key.name.is_empty() {
                    return Err(ValidationError::EmptyTableName {
                        schema: schema.id.clone(),
                    });
                }
                if table.key.catalog != self.name || table.key.schema != schema.id {
                    return Err(ValidationError::MisplacedTable {
                        table: table.key.clone(),
                        catalog: self.name.clone(),
                        schema: schema.id.clone(),
                    });
                }
                if !table_keys.insert(&table.key) {
                    return Err(ValidationError::DuplicateTable {
                        table: table.key.clone(),
                    });
                }
                if table.db_type != listed_as {
                    return Err(ValidationError::DbTypeMismatch {
                        table: table.key.clone(),
                        db_type: table.db_type,
                        listed_as,
                    });
                }
                validate_table_shape(table)?;
            }
        }

        // Forward references are checked across the catalog before reverse ones
        for table in self.tables() {
            self.validate_foreign_keys(table)?;
        }
        for table in self.tables() {
            self.validate_back_references(table)?;
        }

        Ok(())
    }

    fn validate_foreign_keys(&self, table: &Table) -> Result<(), ValidationError> {
        let mut names = HashSet::new();
        for fk in &table.foreign_keys {
            if !names.insert(fk.name.as_str()) {
                return Err(ValidationError::DuplicateForeignKey {
                    table: table.key.clone(),
                    name: fk.name.clone(),
                });
            }

            let Some(target) = self.table(&fk.ref_table) else {
                return Err(ValidationError::DanglingForeignKey {
                    table: table.key.clone(),
                    name: fk.name.clone(),
                    ref_table: fk.ref_table.clone(),
                });
            };

            let mirrored = target
                .referenced_by_table(&table.key)
                .and_then(|rb| rb.foreign_keys.iter().find(|r| r.name == fk.name))
                .is_some_and(|r| r.columns == fk.columns);

            if !mirrored {
                return Err(ValidationError::MissingBackReference {
                    table: table.key.clone(),
                    name: fk.name.clone(),
                    ref_table: fk.ref_table.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_back_references(&self, table: &Table) -> Result<(), ValidationError> {
        let mut sources = HashSet::new();
        for rb in &table.referenced_by {
            if !sources.insert(&rb.table_key) {
                return Err(ValidationError::DuplicateReferencedBy {
                    table: table.key.clone(),
                    referencing: rb.table_key.clone(),
                });
            }

            let referencing = self.table(&rb.table_key);
            let mut names = HashSet::new();
            for ref_fk in &rb.foreign_keys {
                if !names.insert(ref_fk.name.as_str()) {
                    return Err(ValidationError::DuplicateBackReference {
                        table: table.key.clone(),
                        name: ref_fk.name.clone(),
                        referencing: rb.table_key.clone(),
                    });
                }

                let mirrored = referencing.is_some_and(|source| {
                    source.foreign_keys.iter().any(|fk| {
                        fk.name == ref_fk.name
                            && fk.ref_table == table.key
                            && fk.columns == ref_fk.columns
                    })
                });

                if !mirrored {
                    return Err(ValidationError::OrphanBackReference {
                        table: table.key.clone(),
                        name: ref_fk.name.clone(),
                        referencing: rb.table_key.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn validate_table_shape(table: &Table) -> Result<(), ValidationError> {
    let mut column_names = HashSet::new();
    for column in &table.columns {
        if !column_names.insert(column.name.as_str()) {
            return Err(ValidationError::DuplicateColumn {
                table: table.key.clone(),
                column: column.name.clone(),
            });
        }
    }

    let keys = table
        .primary_key
        .iter()
        .map(|k| ("PRIMARY KEY", &k.name, &k.columns))
        .chain(table.unique_keys.iter().map(|k| ("UNIQUE", &k.name, &k.columns)))
        .chain(
            table
                .foreign_keys
                .iter()
                .map(|k| ("FOREIGN KEY", &k.name, &k.columns)),
        );

    for (kind, name, columns) in keys {
        if name.is_empty() {
            return Err(ValidationError::EmptyConstraintName {
                table: table.key.clone(),
                kind,
            });
        }
        if columns.is_empty() {
            return Err(ValidationError::EmptyConstraintColumns {
                table: table.key.clone(),
                name: name.clone(),
            });
        }
    }

    Ok(())
}
