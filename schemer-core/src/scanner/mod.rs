//! Catalog scanning.
//!
//! [`Scanner::scan_catalog`] streams the objects of a catalog into table
//! skeletons, then runs the columns, constraints and indexes sub-scans
//! concurrently against them. Each sub-scan joins its stream onto the
//! skeletons with a [`SequentialMatcher`], relying on every provider
//! delivering rows in `(schema, table)` order.
//!
//! # Module Structure
//! - `config`: Scanner configuration
//! - `context`: Deadline and cancellation
//! - `matcher`: Sequential and full-scan table matchers
//! - `fanout`: Run-all, first-error fan-out executor
//! - `tree`: Per-table locked catalog under construction
//! - `columns`, `constraints`, `indexes`: The three sub-scans
//!
//! # Example
//! ```rust,no_run
//! use schemer_core::providers::sqlite::SqliteProvider;
//! use schemer_core::scanner::{ScanConfig, Scanner};
//! use std::time::Duration;
//!
//! # async fn example() -> schemer_core::Result<()> {
//! let provider = SqliteProvider::new("sqlite:///var/data/shop.db").await?;
//! let scanner = Scanner::new(ScanConfig::default().with_timeout(Duration::from_secs(30)))?;
//! let catalog = scanner
//!     .scan_catalog(&scanner.context(), &provider, "shop")
//!     .await?;
//! println!("{} tables", catalog.table_count());
//! # Ok(())
//! # }
//! ```

mod columns;
pub mod config;
mod constraints;
pub mod context;
pub mod fanout;
mod indexes;
pub mod matcher;
pub mod tree;

pub use config::ScanConfig;
pub use context::ScanContext;
pub use fanout::fan_out;
pub use matcher::{SequentialMatcher, find_table};

use futures::FutureExt;
use std::time::Instant;

use crate::Result;
use crate::error::ScanError;
use crate::models::Catalog;
use crate::providers::{SchemaProvider, Scope};
use tree::{ScanTree, TableSlot};

/// Runs catalog scans with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Creates a scanner after validating its configuration.
    ///
    /// # Errors
    /// Returns a `Configuration` error if `config` is invalid
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Context carrying the configured timeout, if any
    pub fn context(&self) -> ScanContext {
        match self.config.timeout {
            Some(timeout) => ScanContext::with_timeout(timeout),
            None => ScanContext::new(),
        }
    }

    /// Scans one catalog into an owned [`Catalog`].
    ///
    /// The provider must tolerate concurrent queries: up to three sub-scan
    /// readers plus `max_index_concurrency` index column readers are open at
    /// once. On error nothing partial is returned and every reader opened
    /// during the scan has been dropped.
    ///
    /// # Errors
    /// - `ScanTimeout` / `Cancelled` when the context stops the scan
    /// - `Provider` / `Connection` for driver failures
    /// - `Integrity` for rows that cannot be joined onto the catalog
    /// - `Validation` when the assembled catalog breaks an invariant
    pub async fn scan_catalog(
        &self,
        ctx: &ScanContext,
        provider: &dyn SchemaProvider,
        catalog: &str,
    ) -> Result<Catalog> {
        if catalog.is_empty() {
            return Err(ScanError::configuration("Catalog name cannot be empty"));
        }
        ctx.check("objects")?;

        let started = Instant::now();
        tracing::info!(
            "Scanning catalog '{}' ({} provider)",
            catalog,
            provider.database_type()
        );

        let tree = read_objects(ctx, provider, catalog).await?;
        tracing::debug!("Catalog '{}' has {} tables and views", catalog, tree.len());

        let scans = vec![
            columns::scan_columns(ctx, provider, &tree).boxed(),
            constraints::scan_constraints(ctx, provider, &tree).boxed(),
            indexes::scan_indexes(ctx, provider, &tree, self.config.max_index_concurrency).boxed(),
        ];
        if let Err(e) = fan_out(scans, None).await {
            tracing::error!("Scan of catalog '{}' failed: {}", catalog, e);
            return Err(e);
        }

        let result = tree.finalize();
        if self.config.validate_catalog {
            result.validate()?;
        }

        tracing::info!(
            "Scanned catalog '{}': {} schemas, {} tables and views in {:.2}s",
            catalog,
            result.schemas.len(),
            result.table_count(),
            started.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

async fn read_objects(
    ctx: &ScanContext,
    provider: &dyn SchemaProvider,
    catalog: &str,
) -> Result<ScanTree> {
    let mut tree = ScanTree::new(catalog);
    let mut reader = provider.objects(catalog).await?;
    loop {
        ctx.check("objects")?;
        let Some(row) = reader.next_object().await? else {
            break;
        };
        tree.add_object(row)?;
    }
    Ok(tree)
}

/// Reader scopes for one sub-scan, each with the slots its rows may match.
///
/// A bulk provider gets a single catalog-wide reader; otherwise one reader
/// per table, in skeleton order.
fn scan_units<'a>(
    provider: &dyn SchemaProvider,
    tree: &'a ScanTree,
) -> Vec<(Scope<'a>, &'a [TableSlot])> {
    if provider.is_bulk_provider() {
        vec![(Scope::Catalog(tree.catalog()), tree.slots())]
    } else {
        tree.slots()
            .iter()
            .map(|slot| (Scope::Table(&slot.key), std::slice::from_ref(slot)))
            .collect()
    }
}

fn unmatched(kind: &str, name: &str, catalog: &str, schema: &str, table: &str) -> ScanError {
    ScanError::integrity(format!(
        "{} '{}' references unknown or out-of-order table {}.{}.{}",
        kind, name, catalog, schema, table
    ))
}
