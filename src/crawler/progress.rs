//! Progress reporting for long-running phases
//!
//! Frontends implement [`ProgressSink`] to surface status. Every hook has a
//! no-op default, so a sink only overrides what it cares about.

use crate::crawler::FetchError;
use std::fmt;
use std::time::Duration;

/// The two phases of a harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Listing pages to detail URLs
    Discovery,
    /// Detail URLs to records
    Extraction,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => write!(f, "listing"),
            Self::Extraction => write!(f, "detail"),
        }
    }
}

/// Counts after one unit of work completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub phase: Phase,
    /// Units completed so far, failures included
    pub done: usize,
    /// Total units, when known
    pub total: Option<usize>,
    /// Units failed so far
    pub failed: usize,
    /// URL of the unit that just completed
    pub url: String,
}

impl ProgressUpdate {
    /// Completion percentage, when the total is known
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.done as f64 / total as f64 * 100.0),
            None => None,
        }
    }
}

/// Receives progress events from the harvester
///
/// Called from the driver task only, never from workers.
pub trait ProgressSink: Send + Sync {
    /// A phase is starting with `total` units, if known
    fn phase_started(&self, _phase: Phase, _total: Option<usize>) {}

    /// One unit completed, successfully or not
    fn unit_completed(&self, _update: &ProgressUpdate) {}

    /// One unit failed after its retries
    fn unit_failed(&self, _phase: Phase, _error: &FetchError) {}

    /// A phase drained
    fn phase_finished(&self, _phase: Phase, _done: usize, _failed: usize, _elapsed: Duration) {}
}

/// A no-op progress sink
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {}

/// Reports progress through tracing
///
/// Per-unit lines go to debug; a summary line is logged at info every
/// `every` completions.
#[derive(Debug, Clone, Copy)]
pub struct TracingProgress {
    every: usize,
}

impl TracingProgress {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ProgressSink for TracingProgress {
    fn phase_started(&self, phase: Phase, total: Option<usize>) {
        match total {
            Some(total) => tracing::info!(%phase, total, "Phase started"),
            None => tracing::info!(%phase, "Phase started, total unknown"),
        }
    }

    fn unit_completed(&self, update: &ProgressUpdate) {
        tracing::debug!(
            phase = %update.phase,
            done = update.done,
            failed = update.failed,
            url = %update.url,
            "Unit completed"
        );

        if update.done % self.every == 0 {
            match update.percent() {
                Some(percent) => tracing::info!(
                    "Progress ({}): {}/{} ({:.1}%), {} failed",
                    update.phase,
                    update.done,
                    update.total.unwrap_or_default(),
                    percent,
                    update.failed
                ),
                None => tracing::info!(
                    "Progress ({}): {} done, {} failed",
                    update.phase,
                    update.done,
                    update.failed
                ),
            }
        }
    }

    fn unit_failed(&self, phase: Phase, error: &FetchError) {
        tracing::warn!(%phase, status = ?error.status(), "{}", error);
    }

    fn phase_finished(&self, phase: Phase, done: usize, failed: usize, elapsed: Duration) {
        let rate = if elapsed.as_secs_f64() > 0.0 {
            done as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        tracing::info!(
            "Phase {} finished: {} done, {} failed in {:.2?} ({:.2}/sec)",
            phase,
            done,
            failed,
            elapsed,
            rate
        );
    }
}
