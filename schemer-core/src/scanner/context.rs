//! Deadline and cancellation carried through a scan.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::error::ScanError;

/// Optional deadline plus a cancellation token, shared by every sub-scan.
///
/// Checks are cooperative: loops call [`ScanContext::check`] before opening
/// a reader and once per row.
#[derive(Debug, Clone)]
pub struct ScanContext {
    deadline: Option<Instant>,
    token: CancellationToken,
    started: Instant,
}

impl Default for ScanContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanContext {
    /// Context without a deadline
    pub fn new() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
            started: Instant::now(),
        }
    }

    /// Context expiring `timeout` from now. A zero timeout is already expired.
    pub fn with_timeout(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            deadline: Some(started + timeout),
            token: CancellationToken::new(),
            started,
        }
    }

    /// Context expiring at an absolute instant
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    /// Replaces the cancellation token, e.g. with a child of an
    /// application-wide shutdown token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Requests cancellation of every scan sharing this context
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Time since the context was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the deadline, `None` without one
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails with `Cancelled` or `ScanTimeout` once the scan must stop.
    ///
    /// # Errors
    /// `ScanError::Cancelled` if the token was cancelled,
    /// `ScanError::ScanTimeout` if the deadline has passed
    pub fn check(&self, phase: &str) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(ScanError::Cancelled {
                phase: phase.to_string(),
            });
        }
        if self.is_expired() {
            return Err(ScanError::ScanTimeout {
                phase: phase.to_string(),
                elapsed: self.elapsed(),
            });
        }
        Ok(())
    }
}
