//! Catalog model produced by a scan.
//!
//! A [`Catalog`] owns its [`Schema`]s, which own their tables and views.
//! Foreign keys and their back-references ([`ReferencedBy`]) are kept as a
//! symmetric pair: a `ForeignKey` on table A naming table B always has a
//! matching `RefByForeignKey` on B naming A with the same columns.
//!
//! All types are serializable so a persistence layer can write the catalog
//! out unchanged. No timestamps are stored, so two scans of identical
//! metadata compare equal.

use serde::{Deserialize, Serialize};

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    SQLite,
    SqlServer,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::SQLite => write!(f, "SQLite"),
            DatabaseType::SqlServer => write!(f, "SQL Server"),
        }
    }
}

/// Unified data type representation across database engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnifiedDataType {
    /// String/text types with optional length
    String { max_length: Option<u32> },
    /// Integer types with bit width
    Integer { bits: u8, signed: bool },
    /// Floating point types
    Float { precision: Option<u8> },
    /// Exact numeric types
    Decimal {
        precision: Option<u8>,
        scale: Option<u8>,
    },
    /// Boolean type
    Boolean,
    /// Date and time types
    DateTime { with_timezone: bool },
    /// Date only
    Date,
    /// Time only
    Time { with_timezone: bool },
    /// Binary data
    Binary { max_length: Option<u32> },
    /// JSON data
    Json,
    /// UUID type
    Uuid,
    /// Custom/database-specific types
    Custom { type_name: String },
}

impl UnifiedDataType {
    /// Length, precision and scale carried by the type.
    ///
    /// Only character and binary types report a length, and only exact
    /// numerics report precision and scale.
    pub fn facets(&self) -> (Option<i32>, Option<u8>, Option<u8>) {
        match self {
            UnifiedDataType::String { max_length } | UnifiedDataType::Binary { max_length } => {
                (max_length.and_then(|l| i32::try_from(l).ok()), None, None)
            }
            UnifiedDataType::Decimal { precision, scale } => (None, *precision, *scale),
            _ => (None, None, None),
        }
    }
}

/// Object classification reported by the objects stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    BaseTable,
    View,
}

impl DbType {
    /// Parses the classification strings `"BASE TABLE"` and `"VIEW"`.
    ///
    /// Any other value yields `None`; the scanner treats that as an
    /// integrity failure.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BASE TABLE" => Some(DbType::BaseTable),
            "VIEW" => Some(DbType::View),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::BaseTable => "BASE TABLE",
            DbType::View => "VIEW",
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a table or view within a scan.
///
/// SQLite has no schema namespace, so its tables carry the empty schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey {
    pub catalog: String,
    pub schema: String,
    pub name: String,
}

impl TableKey {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive comparison of all three parts
    pub fn eq_ignore_case(&self, catalog: &str, schema: &str, name: &str) -> bool {
        self.catalog.eq_ignore_ascii_case(catalog)
            && self.schema.eq_ignore_ascii_case(schema)
            && self.name.eq_ignore_ascii_case(name)
    }
}

impl std::fmt::Display for TableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.schema.is_empty() {
            write!(f, "{}.{}", self.catalog, self.name)
        } else {
            write!(f, "{}.{}.{}", self.catalog, self.schema, self.name)
        }
    }
}

/// Database column information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ordinal_position: u32,
    /// Native type name as reported by the database
    pub data_type: String,
    pub unified_type: UnifiedDataType,
    pub max_length: Option<i32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub is_nullable: bool,
    pub is_identity: bool,
    pub default_value: Option<String>,
}

/// Sort order for index columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Index column with ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub ordinal_position: u32,
    pub sort_order: SortOrder,
    /// Non-key column carried in the index leaf (SQL Server `INCLUDE`)
    pub is_included: bool,
}

/// Database index information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub is_unique: bool,
    pub is_primary: bool,
    pub index_type: Option<String>,
    pub columns: Vec<IndexColumn>,
}

/// Named ordered column list, used for primary and unique keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// Foreign key owned by the referencing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub ref_table: TableKey,
    /// Referenced columns; empty when the database leaves them implicit
    pub ref_columns: Vec<String>,
}

/// Foreign key as seen from the referenced table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefByForeignKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// All foreign keys one referencing table points at this table with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedBy {
    pub table_key: TableKey,
    pub foreign_keys: Vec<RefByForeignKey>,
}

/// Table or view with everything attached to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub key: TableKey,
    pub db_type: DbType,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub primary_key: Option<UniqueKey>,
    pub unique_keys: Vec<UniqueKey>,
    pub foreign_keys: Vec<ForeignKey>,
    pub referenced_by: Vec<ReferencedBy>,
}

impl Table {
    /// Creates an empty skeleton for a table or view
    pub fn new(key: TableKey, db_type: DbType) -> Self {
        Self {
            key,
            db_type,
            columns: Vec::new(),
            indexes: Vec::new(),
            primary_key: None,
            unique_keys: Vec::new(),
            foreign_keys: Vec::new(),
            referenced_by: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn is_view(&self) -> bool {
        self.db_type == DbType::View
    }

    /// Looks up a column by exact name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up an index by exact name
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Back-reference entry for a referencing table, if any
    pub fn referenced_by_table(&self, key: &TableKey) -> Option<&ReferencedBy> {
        self.referenced_by.iter().find(|r| &r.table_key == key)
    }
}

/// Schema namespace within a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub tables: Vec<Table>,
    pub views: Vec<Table>,
}

impl Schema {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tables: Vec::new(),
            views: Vec::new(),
        }
    }

    /// Iterates base tables followed by views
    pub fn all_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().chain(self.views.iter())
    }
}

/// Root of a scan result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub name: String,
    pub schemas: Vec<Schema>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemas: Vec::new(),
        }
    }

    /// Looks up a schema by id
    pub fn schema(&self, id: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.id == id)
    }

    /// Looks up a table or view by key
    pub fn table(&self, key: &TableKey) -> Option<&Table> {
        self.schema(&key.schema)?
            .all_tables()
            .find(|t| &t.key == key)
    }

    /// Iterates every table and view in schema order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.schemas.iter().flat_map(Schema::all_tables)
    }

    /// Gets the total number of tables and views
    pub fn table_count(&self) -> usize {
        self.schemas
            .iter()
            .map(|s| s.tables.len() + s.views.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table_count() == 0
    }
}
