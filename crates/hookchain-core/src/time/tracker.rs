//! Per-run time tracker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::TimeSource;

/// Timing of one named phase of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    /// Phase name (`pre`, `operation`, `post`, ...).
    pub name: String,
    /// Offset from the tracker start.
    pub started: Duration,
    /// Phase length; `None` while the phase is open.
    pub duration: Option<Duration>,
}

/// Read-only copy of a tracker handed to providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSnapshot {
    /// Wall-clock time the tracker was created.
    pub started_at: DateTime<Utc>,
    /// Time elapsed when the snapshot was taken (or at finish).
    pub elapsed: Duration,
    /// Recorded phases in the order they were opened.
    pub phases: Vec<PhaseTiming>,
    /// Whether the tracker has been finished.
    pub finished: bool,
}

impl TimeSnapshot {
    /// Looks up a phase by name.
    pub fn phase(&self, name: &str) -> Option<&PhaseTiming> {
        self.phases.iter().find(|p| p.name == name)
    }
}

/// Tracks elapsed time and named phases for a single chain run.
#[derive(Debug, Clone)]
pub struct TimeTracker {
    source: Arc<dyn TimeSource>,
    started_at: DateTime<Utc>,
    origin: Duration,
    phases: Vec<PhaseTiming>,
    finished_at: Option<Duration>,
}

impl TimeTracker {
    /// Starts a tracker reading the given source.
    pub fn start(source: Arc<dyn TimeSource>) -> Self {
        let origin = source.now();
        Self {
            source,
            started_at: Utc::now(),
            origin,
            phases: Vec::new(),
            finished_at: None,
        }
    }

    fn offset(&self) -> Duration {
        self.source.now().saturating_sub(self.origin)
    }

    /// Time since start, frozen once [`finish`](Self::finish) was called.
    pub fn elapsed(&self) -> Duration {
        self.finished_at.unwrap_or_else(|| self.offset())
    }

    /// Opens a phase. An already open phase of the same name is left as is.
    pub fn begin_phase(&mut self, name: &str) {
        if self.open_phase(name).is_some() {
            return;
        }
        let started = self.offset();
        self.phases.push(PhaseTiming {
            name: name.to_string(),
            started,
            duration: None,
        });
    }

    /// Closes the most recent open phase with this name.
    pub fn end_phase(&mut self, name: &str) {
        let now = self.offset();
        if let Some(phase) = self
            .phases
            .iter_mut()
            .rev()
            .find(|p| p.name == name && p.duration.is_none())
        {
            phase.duration = Some(now.saturating_sub(phase.started));
        }
    }

    fn open_phase(&self, name: &str) -> Option<&PhaseTiming> {
        self.phases
            .iter()
            .rev()
            .find(|p| p.name == name && p.duration.is_none())
    }

    /// Closes every open phase and freezes `elapsed`.
    pub fn finish(&mut self) {
        if self.finished_at.is_some() {
            return;
        }
        let now = self.offset();
        for phase in self.phases.iter_mut().filter(|p| p.duration.is_none()) {
            phase.duration = Some(now.saturating_sub(phase.started));
        }
        self.finished_at = Some(now);
    }

    /// Returns whether the tracker has been finished.
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Name of the underlying clock.
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Copies the current state.
    pub fn snapshot(&self) -> TimeSnapshot {
        TimeSnapshot {
            started_at: self.started_at,
            elapsed: self.elapsed(),
            phases: self.phases.clone(),
            finished: self.is_finished(),
        }
    }
}
