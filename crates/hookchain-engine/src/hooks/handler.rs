//! Handler callables and the invocation they receive.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use hookchain_core::{HookError, HookResult};

use crate::Value;
use crate::chain::next::Next;
use crate::provider::HandlerProvider;
use crate::target::TargetHandle;

/// Signature of a synchronous handler.
pub type SyncHandlerFn = dyn Fn(Invocation) -> HookResult<Value> + Send + Sync;

/// Signature of an asynchronous handler.
pub type AsyncHandlerFn = dyn Fn(Invocation) -> BoxFuture<'static, HookResult<Value>> + Send + Sync;

/// A registered stage callable.
///
/// Identity is the identity of the shared callable: clones of one `Handler`
/// are the same handler for deregistration, separately built handlers are
/// not, even when built from the same closure.
#[derive(Clone)]
pub enum Handler {
    /// Runs to completion on the calling thread.
    Sync(Arc<SyncHandlerFn>),
    /// Returns a future; forces the chain into async mode.
    Async(Arc<AsyncHandlerFn>),
}

impl Handler {
    /// Builds a synchronous handler from a closure.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Invocation) -> HookResult<Value> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(handler))
    }

    /// Builds an asynchronous handler from a closure returning a future.
    pub fn new_async<F, Fut>(handler: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<Value>> + Send + 'static,
    {
        Self::Async(Arc::new(move |invocation| handler(invocation).boxed()))
    }

    /// Returns whether this handler has to be awaited.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// Returns whether both values refer to the same registered callable.
    pub fn same_as(&self, other: &Handler) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> *const () {
        match self {
            Self::Sync(f) => Arc::as_ptr(f) as *const (),
            Self::Async(f) => Arc::as_ptr(f) as *const (),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_async() { "async" } else { "sync" };
        f.debug_struct("Handler")
            .field("kind", &kind)
            .field("addr", &self.addr())
            .finish()
    }
}

/// Conversion into one or more handlers for bulk registration.
pub trait IntoHandlers {
    /// Produces the handlers in registration order.
    fn into_handlers(self) -> Vec<Handler>;
}

impl IntoHandlers for Handler {
    fn into_handlers(self) -> Vec<Handler> {
        vec![self]
    }
}

impl IntoHandlers for &Handler {
    fn into_handlers(self) -> Vec<Handler> {
        vec![self.clone()]
    }
}

impl IntoHandlers for Vec<Handler> {
    fn into_handlers(self) -> Vec<Handler> {
        self
    }
}

impl IntoHandlers for &[Handler] {
    fn into_handlers(self) -> Vec<Handler> {
        self.to_vec()
    }
}

impl<const N: usize> IntoHandlers for [Handler; N] {
    fn into_handlers(self) -> Vec<Handler> {
        self.into_iter().collect()
    }
}

/// One positional argument passed to a handler.
#[derive(Debug, Clone)]
pub enum HandlerArg {
    /// The error forwarded into this step (`pass_errors`).
    Error(Option<HookError>),
    /// The continuation handle (`use_next`).
    Next(Next),
    /// The target instance (`pass_instance`).
    Instance(TargetHandle),
    /// The wrapper handle (`pass_surrogate`).
    Surrogate(TargetHandle),
    /// One of the current chain arguments.
    Value(Value),
}

/// Everything a handler receives for one activation.
///
/// Arguments are assembled in a fixed order:
/// `[error] [next] [instance] [surrogate] ...values`, each prefix present
/// only when its option is enabled.
#[derive(Debug, Clone)]
pub struct Invocation {
    args: Vec<HandlerArg>,
    provider: HandlerProvider,
    context: TargetHandle,
}

impl Invocation {
    pub(crate) fn new(args: Vec<HandlerArg>, provider: HandlerProvider, context: TargetHandle) -> Self {
        Self {
            args,
            provider,
            context,
        }
    }

    /// The assembled positional arguments.
    pub fn args(&self) -> &[HandlerArg] {
        &self.args
    }

    /// The value arguments, without the prepended handles.
    pub fn values(&self) -> Vec<Value> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                HandlerArg::Value(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// The `index`-th value argument.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                HandlerArg::Value(v) => Some(v),
                _ => None,
            })
            .nth(index)
    }

    /// The continuation handle, when the handler was given one.
    pub fn next(&self) -> Option<&Next> {
        self.args.iter().find_map(|arg| match arg {
            HandlerArg::Next(next) => Some(next),
            _ => None,
        })
    }

    /// The continuation handle, or a protocol error naming the handler's
    /// options.
    pub fn continuation(&self) -> HookResult<&Next> {
        self.next().ok_or_else(|| {
            HookError::protocol(format!(
                "handler for '{}' was not given a continuation (use_next disabled or no_args set)",
                self.provider.action()
            ))
        })
    }

    /// The forwarded error, when `pass_errors` is enabled and one exists.
    pub fn error(&self) -> Option<&HookError> {
        self.args.iter().find_map(|arg| match arg {
            HandlerArg::Error(err) => err.as_ref(),
            _ => None,
        })
    }

    /// The target instance, when `pass_instance` is enabled.
    pub fn instance(&self) -> Option<&TargetHandle> {
        self.args.iter().find_map(|arg| match arg {
            HandlerArg::Instance(h) => Some(h),
            _ => None,
        })
    }

    /// The wrapper handle, when `pass_surrogate` is enabled.
    pub fn surrogate(&self) -> Option<&TargetHandle> {
        self.args.iter().find_map(|arg| match arg {
            HandlerArg::Surrogate(h) => Some(h),
            _ => None,
        })
    }

    /// Read-only view of the run at this step.
    pub fn provider(&self) -> &HandlerProvider {
        &self.provider
    }

    /// The execution context selected by `use_context`.
    pub fn context(&self) -> &TargetHandle {
        &self.context
    }
}
