//! Chain execution configuration.

use serde::{Deserialize, Serialize};

/// Which clock the per-run time tracker reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSourceKind {
    /// `std::time::Instant`.
    #[default]
    Monotonic,
    /// `chrono::Utc::now()`.
    WallClock,
}

/// Settings applied to every registry and chain built from this config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Priority given to handlers registered without one.
    #[serde(default)]
    pub default_priority: i32,
    /// Whether unrecovered chain errors are logged before propagating.
    #[serde(default = "default_true")]
    pub log_errors: bool,
    /// Whether invalid registrations emit a warning.
    #[serde(default = "default_true")]
    pub warn_on_misconfiguration: bool,
    /// Clock used for elapsed-time tracking.
    #[serde(default)]
    pub time_source: TimeSourceKind,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            default_priority: 0,
            log_errors: true,
            warn_on_misconfiguration: true,
            time_source: TimeSourceKind::default(),
        }
    }
}

fn default_true() -> bool {
    true
}
