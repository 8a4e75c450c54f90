//! Scripted schema provider shared by the scanner integration tests.
//!
//! Rows are supplied up front and handed out per reader, filtered by scope.
//! Every reader is tracked so tests can assert that all opened readers were
//! dropped, which streams ran to the end, and how many were open at once.

#![allow(dead_code)]

use async_trait::async_trait;
use schemer_core::models::{DatabaseType, TableKey, UnifiedDataType};
use schemer_core::providers::{
    ColumnReader, ColumnRow, ConstraintReader, ConstraintRow, IndexColumnReader, IndexColumnRow,
    IndexReader, IndexRow, ObjectReader, ObjectRow, SchemaProvider, Scope,
};
use schemer_core::{Result, ScanError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Metadata stream kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Objects,
    Columns,
    Indexes,
    IndexColumns,
    Constraints,
}

const STREAMS: usize = 5;

/// Reader lifecycle counters
#[derive(Debug, Default)]
pub struct Tracker {
    opened: AtomicUsize,
    dropped: AtomicUsize,
    finished: [AtomicUsize; STREAMS],
    active: [AtomicUsize; STREAMS],
    peak: [AtomicUsize; STREAMS],
}

impl Tracker {
    fn open(&self, stream: Stream) {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.active[stream as usize].fetch_add(1, Ordering::SeqCst) + 1;
        self.peak[stream as usize].fetch_max(now, Ordering::SeqCst);
    }

    fn close(&self, stream: Stream) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
        self.active[stream as usize].fetch_sub(1, Ordering::SeqCst);
    }
}

/// Provider answering from in-memory rows
#[derive(Debug, Default)]
pub struct MockProvider {
    bulk: bool,
    objects: Vec<ObjectRow>,
    columns: Vec<ColumnRow>,
    indexes: Vec<IndexRow>,
    index_columns: Vec<(TableKey, String, Vec<IndexColumnRow>)>,
    constraints: Vec<ConstraintRow>,
    failing: Option<Stream>,
    row_delay: Option<Duration>,
    tracker: Arc<Tracker>,
}

impl MockProvider {
    /// Bulk providers accept `Scope::Catalog`; others are read per table
    pub fn new(bulk: bool) -> Self {
        Self {
            bulk,
            ..Self::default()
        }
    }

    pub fn object(mut self, schema: &str, name: &str, db_type: &str) -> Self {
        self.objects.push(ObjectRow {
            schema: schema.to_string(),
            name: name.to_string(),
            db_type: db_type.to_string(),
        });
        self
    }

    pub fn column(mut self, schema: &str, table: &str, name: &str, ordinal: u32, data_type: &str) -> Self {
        let unified_type = match data_type {
            "int" => UnifiedDataType::Integer {
                bits: 32,
                signed: true,
            },
            _ => UnifiedDataType::String { max_length: None },
        };
        self.columns.push(ColumnRow {
            schema: schema.to_string(),
            table: table.to_string(),
            name: name.to_string(),
            ordinal,
            data_type: data_type.to_string(),
            unified_type,
            max_length: None,
            precision: None,
            scale: None,
            is_nullable: ordinal > 1,
            is_identity: ordinal == 1,
            default_value: None,
        });
        self
    }

    pub fn index(mut self, schema: &str, table: &str, name: &str, is_unique: bool, is_primary: bool) -> Self {
        self.indexes.push(IndexRow {
            schema: schema.to_string(),
            table: table.to_string(),
            name: name.to_string(),
            is_unique,
            is_primary,
            index_type: is_primary.then(|| "CLUSTERED".to_string()),
        });
        self
    }

    pub fn index_column(mut self, table: TableKey, index: &str, column: &str, ordinal: u32) -> Self {
        let row = IndexColumnRow {
            name: column.to_string(),
            ordinal,
            is_descending: false,
            is_included: false,
        };
        match self
            .index_columns
            .iter_mut()
            .find(|(key, name, _)| *key == table && name == index)
        {
            Some((_, _, rows)) => rows.push(row),
            None => self.index_columns.push((table, index.to_string(), vec![row])),
        }
        self
    }

    pub fn key_constraint(mut self, schema: &str, table: &str, kind: &str, name: &str, column: &str) -> Self {
        self.constraints.push(ConstraintRow {
            schema: schema.to_string(),
            table: table.to_string(),
            constraint_type: kind.to_string(),
            constraint_name: name.to_string(),
            column_name: column.to_string(),
            ref_schema: None,
            ref_table: None,
            ref_column: None,
        });
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn foreign_key(
        mut self,
        schema: &str,
        table: &str,
        name: &str,
        column: &str,
        ref_schema: &str,
        ref_table: &str,
        ref_column: &str,
    ) -> Self {
        self.constraints.push(ConstraintRow {
            schema: schema.to_string(),
            table: table.to_string(),
            constraint_type: "FOREIGN KEY".to_string(),
            constraint_name: name.to_string(),
            column_name: column.to_string(),
            ref_schema: Some(ref_schema.to_string()),
            ref_table: Some(ref_table.to_string()),
            ref_column: Some(ref_column.to_string()),
        });
        self
    }

    /// Appends a raw constraint row
    pub fn constraint_row(mut self, row: ConstraintRow) -> Self {
        self.constraints.push(row);
        self
    }

    /// Readers of `stream` fail on their first row
    pub fn failing(mut self, stream: Stream) -> Self {
        self.failing = Some(stream);
        self
    }

    /// Every `next_*` call sleeps first
    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }

    pub fn opened(&self) -> usize {
        self.tracker.opened.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.tracker.dropped.load(Ordering::SeqCst)
    }

    /// Readers of `stream` that returned end-of-stream
    pub fn finished(&self, stream: Stream) -> usize {
        self.tracker.finished[stream as usize].load(Ordering::SeqCst)
    }

    /// Most readers of `stream` open at the same time
    pub fn peak(&self, stream: Stream) -> usize {
        self.tracker.peak[stream as usize].load(Ordering::SeqCst)
    }

    fn reader<T: Send>(&self, stream: Stream, rows: Vec<T>) -> MockReader<T> {
        self.tracker.open(stream);
        MockReader {
            rows: rows.into_iter(),
            stream,
            fail: self.failing == Some(stream),
            delay: self.row_delay,
            tracker: Arc::clone(&self.tracker),
        }
    }

    fn scoped<T: Clone>(&self, scope: Scope<'_>, rows: &[T], table_of: impl Fn(&T) -> (&str, &str)) -> Result<Vec<T>> {
        match scope {
            Scope::Catalog(_) if !self.bulk => Err(ScanError::unsupported_feature(
                "catalog-wide metadata readers",
                "mock",
            )),
            Scope::Catalog(_) => Ok(rows.to_vec()),
            Scope::Table(key) => Ok(rows
                .iter()
                .filter(|row| table_of(row) == (key.schema.as_str(), key.name.as_str()))
                .cloned()
                .collect()),
        }
    }
}

/// Reader over scripted rows
pub struct MockReader<T> {
    rows: std::vec::IntoIter<T>,
    stream: Stream,
    fail: bool,
    delay: Option<Duration>,
    tracker: Arc<Tracker>,
}

impl<T: Send> MockReader<T> {
    async fn next_row(&mut self) -> Result<Option<T>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ScanError::provider_failed(
                format!("{:?} query failed", self.stream),
                std::io::Error::other("injected failure"),
            ));
        }
        let row = self.rows.next();
        if row.is_none() {
            self.tracker.finished[self.stream as usize].fetch_add(1, Ordering::SeqCst);
        }
        Ok(row)
    }
}

impl<T> Drop for MockReader<T> {
    fn drop(&mut self) {
        self.tracker.close(self.stream);
    }
}

macro_rules! impl_mock_reader {
    ($reader:ident, $method:ident, $row:ty) => {
        #[async_trait]
        impl $reader for MockReader<$row> {
            async fn $method(&mut self) -> Result<Option<$row>> {
                self.next_row().await
            }
        }
    };
}

impl_mock_reader!(ObjectReader, next_object, ObjectRow);
impl_mock_reader!(ColumnReader, next_column, ColumnRow);
impl_mock_reader!(IndexReader, next_index, IndexRow);
impl_mock_reader!(IndexColumnReader, next_index_column, IndexColumnRow);
impl_mock_reader!(ConstraintReader, next_constraint, ConstraintRow);

#[async_trait]
impl SchemaProvider for MockProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }

    fn is_bulk_provider(&self) -> bool {
        self.bulk
    }

    async fn objects(&self, _catalog: &str) -> Result<Box<dyn ObjectReader>> {
        Ok(Box::new(self.reader(Stream::Objects, self.objects.clone())))
    }

    async fn columns(&self, scope: Scope<'_>) -> Result<Box<dyn ColumnReader>> {
        let rows = self.scoped(scope, &self.columns, |r| (r.schema.as_str(), r.table.as_str()))?;
        Ok(Box::new(self.reader(Stream::Columns, rows)))
    }

    async fn indexes(&self, scope: Scope<'_>) -> Result<Box<dyn IndexReader>> {
        let rows = self.scoped(scope, &self.indexes, |r| (r.schema.as_str(), r.table.as_str()))?;
        Ok(Box::new(self.reader(Stream::Indexes, rows)))
    }

    async fn index_columns(&self, table: &TableKey, index_name: &str) -> Result<Box<dyn IndexColumnReader>> {
        let rows = self
            .index_columns
            .iter()
            .find(|(key, name, _)| key == table && name == index_name)
            .map(|(_, _, rows)| rows.clone())
            .unwrap_or_default();
        Ok(Box::new(self.reader(Stream::IndexColumns, rows)))
    }

    async fn constraints(&self, scope: Scope<'_>) -> Result<Box<dyn ConstraintReader>> {
        let rows = self.scoped(scope, &self.constraints, |r| (r.schema.as_str(), r.table.as_str()))?;
        Ok(Box::new(self.reader(Stream::Constraints, rows)))
    }
}

/// `sales.dbo` with `customers` and `orders`, orders referencing customers.
///
/// Rows are listed in provider order.
pub fn sales_provider(bulk: bool) -> MockProvider {
    let customers = TableKey::new("sales", "dbo", "customers");
    let orders = TableKey::new("sales", "dbo", "orders");

    MockProvider::new(bulk)
        .object("dbo", "customers", "BASE TABLE")
        .object("dbo", "orders", "BASE TABLE")
        .column("dbo", "customers", "id", 1, "int")
        .column("dbo", "customers", "name", 2, "nvarchar")
        .column("dbo", "orders", "id", 1, "int")
        .column("dbo", "orders", "customer_id", 2, "int")
        .index("dbo", "customers", "PK_customers", true, true)
        .index("dbo", "orders", "IX_orders_customer", false, false)
        .index("dbo", "orders", "PK_orders", true, true)
        .index_column(customers, "PK_customers", "id", 1)
        .index_column(orders.clone(), "IX_orders_customer", "customer_id", 1)
        .index_column(orders, "PK_orders", "id", 1)
        .key_constraint("dbo", "customers", "PRIMARY KEY", "PK_customers", "id")
        .foreign_key(
            "dbo",
            "orders",
            "FK_orders_customers",
            "customer_id",
            "dbo",
            "customers",
            "id",
        )
        .key_constraint("dbo", "orders", "PRIMARY KEY", "PK_orders", "id")
}
