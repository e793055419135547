//! Elapsed-time accounting for chain runs.
//!
//! The clock is pluggable through [`TimeSource`]; the tracker itself only
//! does arithmetic on the durations a source reports.

pub mod source;
pub mod tracker;

pub use source::{ManualTimeSource, MonotonicTimeSource, TimeSource, WallClockTimeSource};
pub use tracker::{PhaseTiming, TimeSnapshot, TimeTracker};

use std::sync::Arc;

use crate::config::chain::TimeSourceKind;

/// Builds the time source selected in configuration.
pub fn time_source_for(kind: TimeSourceKind) -> Arc<dyn TimeSource> {
    match kind {
        TimeSourceKind::Monotonic => Arc::new(MonotonicTimeSource::new()),
        TimeSourceKind::WallClock => Arc::new(WallClockTimeSource::new()),
    }
}
