//! Clock strategies for the time tracker.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A clock reporting time elapsed since the source was created.
pub trait TimeSource: Send + Sync + fmt::Debug {
    /// Time elapsed since this source's origin.
    fn now(&self) -> Duration;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTimeSource {
    origin: Instant,
}

impl MonotonicTimeSource {
    /// Creates a source whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn name(&self) -> &'static str {
        "monotonic"
    }
}

/// Wall clock backed by `chrono::Utc`.
///
/// Readings taken after the system clock moves backwards saturate at zero.
#[derive(Debug, Clone, Copy)]
pub struct WallClockTimeSource {
    origin: DateTime<Utc>,
}

impl WallClockTimeSource {
    /// Creates a source whose origin is now.
    pub fn new() -> Self {
        Self { origin: Utc::now() }
    }
}

impl Default for WallClockTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClockTimeSource {
    fn now(&self) -> Duration {
        (Utc::now() - self.origin).to_std().unwrap_or(Duration::ZERO)
    }

    fn name(&self) -> &'static str {
        "wall_clock"
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    current: Arc<Mutex<Duration>>,
}

impl ManualTimeSource {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        *self.current.lock()
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}
