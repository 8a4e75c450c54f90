//! Scanner configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;
use crate::error::ScanError;

/// Upper bound for concurrent index column sub-scans
pub const MAX_INDEX_CONCURRENCY: usize = 64;

/// Settings for [`Scanner`](super::Scanner).
///
/// # Example
/// ```rust
/// use schemer_core::scanner::ScanConfig;
/// use std::time::Duration;
///
/// let config = ScanConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_max_index_concurrency(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Deadline applied to contexts built by `Scanner::context`
    pub timeout: Option<Duration>,
    /// Index column readers open at once per scan
    pub max_index_concurrency: usize,
    /// Run `Catalog::validate` before returning a catalog
    pub validate_catalog: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_index_concurrency: 8,
            validate_catalog: true,
        }
    }
}

impl ScanConfig {
    /// Validates scanner configuration.
    ///
    /// # Errors
    /// Returns error if the concurrency bound is outside `1..=64` or the
    /// timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.max_index_concurrency == 0 {
            return Err(ScanError::configuration(
                "max_index_concurrency must be greater than 0",
            ));
        }

        if self.max_index_concurrency > MAX_INDEX_CONCURRENCY {
            return Err(ScanError::configuration(format!(
                "max_index_concurrency should not exceed {}",
                MAX_INDEX_CONCURRENCY
            )));
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ScanError::configuration(
                "timeout must be greater than 0 when set",
            ));
        }

        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_index_concurrency(mut self, max: usize) -> Self {
        self.max_index_concurrency = max;
        self
    }

    /// Builder method to skip the final `Catalog::validate` pass.
    pub fn with_validation(mut self, validate_catalog: bool) -> Self {
        self.validate_catalog = validate_catalog;
        self
    }
}
