//! Per-invocation chain execution.
//!
//! A run walks the PRE list, the wrapped operation, then the POST list.
//! Each list is addressed by an explicit cursor; the position one past the
//! last descriptor is the terminal step (the operation for PRE, completion
//! for POST).

pub mod controller;
pub mod next;
pub mod operation;
pub(crate) mod rules;
pub(crate) mod runner;
pub mod state;

pub use controller::{ChainSettings, ControllerBuilder, ExecutionController};
pub use next::{Next, NextOptions};
pub use operation::Operation;
pub use state::{ChainMode, ChainState};
