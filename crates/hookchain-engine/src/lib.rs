//! # hookchain-engine
//!
//! Chain execution engine for hookchain. Provides:
//!
//! - Hook registry with stable priority ordering and copy-on-write lists
//! - Continuation handles (`next`, `skip`, bail, error) for PRE/POST chains
//! - Error and bail recovery rules with `run_on_error` / `run_on_bail`
//! - Sync and async execution controllers around a wrapped operation
//! - Read-only provider views for handlers and run conditions
//! - An explicit wrapping factory with per-type hook declarations

pub mod chain;
pub mod hooks;
pub mod intercept;
pub mod macros;
pub mod prelude;
pub mod provider;
pub mod target;

pub use chain::controller::{ChainSettings, ExecutionController};
pub use chain::next::{Next, NextOptions};
pub use chain::operation::Operation;
pub use chain::state::{ChainMode, ChainState};
pub use hooks::descriptor::HandlerDescriptor;
pub use hooks::handler::{Handler, HandlerArg, Invocation};
pub use hooks::options::{HookOptions, ResolvedOptions, UseContext, Wrapper};
pub use hooks::registry::{EventHandlers, HookRegistry};
pub use intercept::hooked::Hooked;
pub use intercept::store::InstanceStore;
pub use provider::{BailProvider, ErrorProvider, HandlerProvider, RunConditionProvider};
pub use target::TargetHandle;

pub use hookchain_core::{CorrelationId, ErrorKind, HookError, HookResult, HookType};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}

/// Dynamic argument and result values flowing through a chain.
pub type Value = serde_json::Value;
