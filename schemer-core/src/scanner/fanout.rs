//! Fan-out / fan-in over independent scan futures.
//!
//! All futures are polled concurrently within the calling task and every one
//! of them runs to completion; siblings are never cancelled because one
//! failed. The first error to occur is returned after the others finish, so
//! every reader they opened has been dropped by then.

use futures::stream::{self, StreamExt};
use std::future::Future;

use crate::Result;

/// Runs every future, at most `limit` at a time (`None` means all at once).
///
/// Returns the successful outputs in completion order, or the error that
/// occurred first. Later errors are logged at debug level and discarded.
///
/// # Errors
/// The temporally first error returned by any of the futures
pub async fn fan_out<I, F, T>(futures: I, limit: Option<usize>) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let limit = limit.unwrap_or(usize::MAX).max(1);
    let mut running = stream::iter(futures).buffer_unordered(limit);

    let mut outputs = Vec::new();
    let mut first_error = None;
    while let Some(result) = running.next().await {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => tracing::debug!("Additional scan failure after first error: {}", e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(outputs),
    }
}
