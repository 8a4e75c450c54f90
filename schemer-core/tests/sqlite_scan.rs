//! SQLite end-to-end scan tests.
//!
//! This test suite covers:
//! - Tables and views from sqlite_master
//! - Composite primary keys and UNIQUE constraints
//! - Foreign keys, including self-references, and their back-references
//! - Index columns with sort order
//! - Opening providers through the registry
//!
//! Note: SQLite tests use in-memory databases, so no external services needed.

#![cfg(feature = "sqlite")]

use schemer_core::models::{Catalog, SortOrder, TableKey, UnifiedDataType};
use schemer_core::providers::sqlite::SqliteProvider;
use schemer_core::providers::{ConnectionConfig, ProviderRegistry, detect_driver};
use schemer_core::{Result, ScanConfig, ScanContext, ScanError, Scanner};
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;

const SHOP_DDL: &[&str] = &[
    "CREATE TABLE customers (id INTEGER PRIMARY KEY, email TEXT NOT NULL UNIQUE, name TEXT)",
    "CREATE TABLE employees (id INTEGER PRIMARY KEY, manager_id INTEGER REFERENCES employees(id), name TEXT NOT NULL)",
    "CREATE TABLE order_lines (order_id INTEGER NOT NULL REFERENCES orders(id), line_no INTEGER NOT NULL, sku VARCHAR(32), PRIMARY KEY (order_id, line_no))",
    "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER NOT NULL REFERENCES customers(id), placed_at DATETIME, total DECIMAL(10, 2))",
    "CREATE INDEX ix_orders_placed ON orders (customer_id, placed_at DESC)",
    "CREATE VIEW big_orders AS SELECT id, total FROM orders WHERE total > 100",
];

/// Helper function to create a provider over an in-memory database with schema
async fn shop_provider() -> Result<SqliteProvider> {
    provider_with(SHOP_DDL).await
}

async fn provider_with(ddl: &[&str]) -> Result<SqliteProvider> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| ScanError::connection_failed("in-memory pool", e))?;
    for statement in ddl {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .map_err(|e| ScanError::provider_failed("ddl", e))?;
    }
    Ok(SqliteProvider::from_pool(pool))
}

async fn scan_shop() -> Result<Catalog> {
    let provider = shop_provider().await?;
    Scanner::default()
        .scan_catalog(&ScanContext::new(), &provider, "shop")
        .await
}

fn key(name: &str) -> TableKey {
    TableKey::new("shop", "", name)
}

// =============================================================================
// Catalog Layout
// =============================================================================

#[tokio::test]
async fn test_sqlite_scan_layout() -> Result<()> {
    let catalog = scan_shop().await?;

    assert_eq!(catalog.name, "shop");
    assert_eq!(catalog.schemas.len(), 1);

    let schema = catalog.schema("").expect("default schema");
    let tables: Vec<_> = schema.tables.iter().map(|t| t.name()).collect();
    assert_eq!(tables, vec!["customers", "employees", "order_lines", "orders"]);
    assert_eq!(schema.views.len(), 1);
    assert_eq!(schema.views[0].key, key("big_orders"));
    Ok(())
}

#[tokio::test]
async fn test_sqlite_scan_keeps_sqlite_like_user_tables() -> Result<()> {
    let provider = provider_with(&[
        "CREATE TABLE SQLiteLogs (id INTEGER PRIMARY KEY, message TEXT)",
        "CREATE TABLE sqlitemeta (k TEXT PRIMARY KEY, v TEXT)",
        "CREATE TABLE events (id INTEGER PRIMARY KEY, log_id INTEGER REFERENCES SQLiteLogs(id))",
    ])
    .await?;

    let catalog = Scanner::default()
        .scan_catalog(&ScanContext::new(), &provider, "shop")
        .await?;

    let schema = catalog.schema("").expect("default schema");
    let tables: Vec<_> = schema.tables.iter().map(|t| t.name()).collect();
    assert_eq!(tables, vec!["SQLiteLogs", "events", "sqlitemeta"]);

    let logs = catalog.table(&key("SQLiteLogs")).expect("SQLiteLogs");
    assert!(logs.referenced_by_table(&key("events")).is_some());

    // sqlite_autoindex_sqlitemeta_1 backs the TEXT primary key
    let meta = catalog.table(&key("sqlitemeta")).expect("sqlitemeta");
    assert!(meta.indexes.iter().any(|i| i.is_primary));
    Ok(())
}

#[tokio::test]
async fn test_sqlite_scan_columns() -> Result<()> {
    let catalog = scan_shop().await?;
    let orders = catalog.table(&key("orders")).expect("orders");

    let names: Vec<_> = orders.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "customer_id", "placed_at", "total"]);

    let id = orders.column("id").expect("id");
    assert!(id.is_identity);
    assert!(!id.is_nullable);

    let total = orders.column("total").expect("total");
    assert_eq!(
        total.unified_type,
        UnifiedDataType::Decimal {
            precision: Some(10),
            scale: Some(2)
        }
    );
    assert_eq!((total.precision, total.scale), (Some(10), Some(2)));

    let view = catalog.table(&key("big_orders")).expect("view");
    assert!(view.is_view());
    assert_eq!(view.columns.len(), 2);
    Ok(())
}

// =============================================================================
// Constraints
// =============================================================================

#[tokio::test]
async fn test_sqlite_scan_keys() -> Result<()> {
    let catalog = scan_shop().await?;

    let lines = catalog.table(&key("order_lines")).expect("order_lines");
    let pk = lines.primary_key.as_ref().expect("composite pk");
    assert_eq!(pk.name, "pk_order_lines");
    assert_eq!(pk.columns, vec!["order_id", "line_no"]);

    let customers = catalog.table(&key("customers")).expect("customers");
    assert_eq!(
        customers.primary_key.as_ref().map(|pk| pk.columns.clone()),
        Some(vec!["id".to_string()])
    );
    assert_eq!(customers.unique_keys.len(), 1);
    assert_eq!(customers.unique_keys[0].columns, vec!["email"]);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_scan_foreign_keys() -> Result<()> {
    let catalog = scan_shop().await?;

    let orders = catalog.table(&key("orders")).expect("orders");
    assert_eq!(orders.foreign_keys.len(), 1);
    let fk = &orders.foreign_keys[0];
    assert_eq!(fk.name, "fk_orders_0");
    assert_eq!(fk.columns, vec!["customer_id"]);
    assert_eq!(fk.ref_table, key("customers"));
    assert_eq!(fk.ref_columns, vec!["id"]);

    let customers = catalog.table(&key("customers")).expect("customers");
    let back = customers
        .referenced_by_table(&key("orders"))
        .expect("back-reference from orders");
    assert_eq!(back.foreign_keys.len(), 1);
    assert_eq!(back.foreign_keys[0].name, "fk_orders_0");

    // order_lines -> orders
    let orders_back = orders
        .referenced_by_table(&key("order_lines"))
        .expect("back-reference from order_lines");
    assert_eq!(orders_back.foreign_keys[0].columns, vec!["order_id"]);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_scan_self_reference() -> Result<()> {
    let catalog = scan_shop().await?;

    let employees = catalog.table(&key("employees")).expect("employees");
    assert_eq!(employees.foreign_keys.len(), 1);
    assert_eq!(employees.foreign_keys[0].ref_table, key("employees"));

    let own = employees
        .referenced_by_table(&key("employees"))
        .expect("self back-reference");
    assert_eq!(own.foreign_keys[0].columns, vec!["manager_id"]);
    assert!(catalog.validate().is_ok());
    Ok(())
}

// =============================================================================
// Indexes
// =============================================================================

#[tokio::test]
async fn test_sqlite_scan_index_columns() -> Result<()> {
    let catalog = scan_shop().await?;

    let orders = catalog.table(&key("orders")).expect("orders");
    let ix = orders.index("ix_orders_placed").expect("index");
    assert!(!ix.is_unique);
    let columns: Vec<_> = ix
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.sort_order))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("customer_id", SortOrder::Ascending),
            ("placed_at", SortOrder::Descending)
        ]
    );

    let lines = catalog.table(&key("order_lines")).expect("order_lines");
    let pk_index = lines
        .indexes
        .iter()
        .find(|i| i.is_primary)
        .expect("primary key index");
    assert!(pk_index.is_unique);
    assert_eq!(pk_index.columns.len(), 2);
    Ok(())
}

// =============================================================================
// Scan Behavior
// =============================================================================

#[tokio::test]
async fn test_sqlite_scan_is_idempotent() -> Result<()> {
    let provider = shop_provider().await?;
    let scanner = Scanner::new(ScanConfig::default().with_max_index_concurrency(2))?;

    let first = scanner
        .scan_catalog(&ScanContext::new(), &provider, "shop")
        .await?;
    let second = scanner
        .scan_catalog(&ScanContext::new(), &provider, "shop")
        .await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_scan_expired_deadline() -> Result<()> {
    let provider = shop_provider().await?;
    let err = Scanner::default()
        .scan_catalog(&ScanContext::with_timeout(Duration::ZERO), &provider, "shop")
        .await
        .expect_err("expired");
    assert!(err.is_timeout());
    Ok(())
}

#[tokio::test]
async fn test_sqlite_scan_through_registry() -> Result<()> {
    let registry = ProviderRegistry::with_defaults();
    let connection_string = ":memory:";
    let provider = registry
        .open(
            detect_driver(connection_string)?,
            connection_string,
            &ConnectionConfig::default(),
        )
        .await?;

    let catalog = Scanner::default()
        .scan_catalog(&ScanContext::new(), provider.as_ref(), "main")
        .await?;
    assert!(catalog.is_empty());
    assert!(catalog.validate().is_ok());
    Ok(())
}
