//! The wrapped operation a chain runs around.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use hookchain_core::HookResult;

use crate::Value;

/// Signature of a synchronous operation body.
pub type SyncOperationFn = dyn Fn(Vec<Value>) -> HookResult<Value> + Send + Sync;

/// Signature of an asynchronous operation body.
pub type AsyncOperationFn =
    dyn Fn(Vec<Value>) -> BoxFuture<'static, HookResult<Value>> + Send + Sync;

/// Operation body, already bound to its target.
#[derive(Clone)]
pub enum Operation {
    /// Runs inline.
    Sync(Arc<SyncOperationFn>),
    /// Awaited; forces async mode.
    Async(Arc<AsyncOperationFn>),
}

impl Operation {
    /// Wraps a synchronous body.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(Vec<Value>) -> HookResult<Value> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(body))
    }

    /// Wraps an asynchronous body.
    pub fn new_async<F, Fut>(body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<Value>> + Send + 'static,
    {
        Self::Async(Arc::new(move |args| body(args).boxed()))
    }

    /// Whether the body must be awaited.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => write!(f, "Operation::Sync"),
            Self::Async(_) => write!(f, "Operation::Async"),
        }
    }
}
