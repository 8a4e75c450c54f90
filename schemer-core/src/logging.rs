//! Logging setup for applications embedding the scanner.
//!
//! The library only emits `tracing` events under its module paths
//! (`schemer_core::scanner::*` for scan phases, `schemer_core::providers::*`
//! for drivers). [`init_logging`] installs a fmt subscriber whose filter
//! raises the scanner's own verbosity while keeping driver crates quiet.

use tracing_subscriber::EnvFilter;

use crate::Result;
use crate::error::ScanError;

/// Driver crates whose chatter is only wanted at the highest verbosity
const DRIVER_TARGETS: &[&str] = &["sqlx", "tiberius", "bb8"];

/// Builds the filter directives for a verbosity count and quiet flag.
///
/// - quiet: errors only, from every target
/// - 0: scanner INFO (one line per catalog), everything else WARN
/// - 1: scanner DEBUG (phase progress, skipped rows), everything else WARN
/// - 2+: scanner TRACE, driver crates DEBUG
pub fn filter_directives(verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }

    let (own, drivers) = match verbose {
        0 => ("info", "warn"),
        1 => ("debug", "warn"),
        _ => ("trace", "debug"),
    };

    let mut directives = vec!["warn".to_string(), format!("schemer_core={own}")];
    directives.extend(DRIVER_TARGETS.iter().map(|t| format!("{t}={drivers}")));
    directives.join(",")
}

/// Installs a global fmt subscriber at the requested verbosity.
///
/// A valid `RUST_LOG` takes precedence over the verbosity flags.
///
/// # Errors
/// Returns a `Configuration` error when a global subscriber is already set.
///
/// # Example
/// ```rust,no_run
/// use schemer_core::logging::init_logging;
///
/// // Scan phases are logged at DEBUG
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(verbose, quiet)).map_err(|e| {
            ScanError::configuration(format!("Invalid logging directives: {}", e))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 0)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| ScanError::configuration(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}
