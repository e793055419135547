//! Run state shared by every node of one invocation.

use std::fmt;

use serde::{Deserialize, Serialize};

use hookchain_core::HookError;
use hookchain_core::time::TimeTracker;

use crate::Value;

/// Whether a chain is driven inline or through futures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainMode {
    /// Every handler and the operation are synchronous.
    Sync,
    /// At least one handler or the operation must be awaited.
    Async,
}

/// Lifecycle of an execution controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    /// Built, not started.
    Created,
    /// Walking the PRE list.
    RunningPre,
    /// Running the wrapped operation.
    RunningOperation,
    /// Walking the POST list.
    RunningPost,
    /// Resolved with the operation result.
    Completed,
    /// Short-circuited by a bail.
    Bailed,
    /// Failed with an unrecovered error.
    Errored,
}

impl ChainState {
    /// Whether no further node can run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Bailed | Self::Errored)
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::RunningPre => "running_pre",
            Self::RunningOperation => "running_operation",
            Self::RunningPost => "running_post",
            Self::Completed => "completed",
            Self::Bailed => "bailed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Mutable part of a run, guarded by the controller's lock.
#[derive(Debug)]
pub(crate) struct ChainRun {
    pub(crate) state: ChainState,
    /// PRE-chain arguments; what the operation is called with.
    pub(crate) current_args: Vec<Value>,
    /// POST-chain arguments; start from the original arguments.
    pub(crate) post_args: Vec<Value>,
    pub(crate) result: Option<Value>,
    pub(crate) bail_value: Option<Value>,
    pub(crate) error: Option<HookError>,
    pub(crate) timer: TimeTracker,
}

impl ChainRun {
    pub(crate) fn new(args: Vec<Value>, timer: TimeTracker) -> Self {
        Self {
            state: ChainState::Created,
            current_args: args.clone(),
            post_args: args,
            result: None,
            bail_value: None,
            error: None,
            timer,
        }
    }

    pub(crate) fn errored(&self) -> bool {
        self.state == ChainState::Errored
    }
}
