//! Common imports for registering handlers and wrapping targets.

pub use async_trait::async_trait;

pub use crate::chain::{ChainMode, ChainState, ExecutionController, Next, NextOptions, Operation};
pub use crate::hook_args;
pub use crate::hooks::{
    AsyncHookHandler, Handler, HandlerArg, HookOptions, HookRegistry, Invocation, SyncHookHandler,
    UseContext, Wrapper,
};
pub use crate::intercept::{Hooked, InstanceStore, declare_hooks};
pub use crate::provider::{BailProvider, ErrorProvider, HandlerProvider, RunConditionProvider};
pub use crate::target::TargetHandle;
pub use crate::Value;

pub use hookchain_core::{ErrorKind, HookError, HookResult, HookType};
