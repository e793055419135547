//! The continuation protocol.
//!
//! Every handler activation receives a [`Next`] bound to its position in
//! the PRE or POST list. Consuming it applies the step rules and activates
//! the node that follows. A handle can be consumed once.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::{debug, trace};

use hookchain_core::{HookError, HookResult, HookType};

use super::controller::ChainInner;
use super::rules::{Step, plan_step, run_conditions_pass};
use super::runner::{self, Settlement};
use super::state::ChainMode;
use crate::Value;
use crate::hooks::descriptor::HandlerDescriptor;

/// What a handler asks of the chain when it calls `next`.
#[derive(Debug, Clone, Default)]
pub struct NextOptions {
    /// Signal an error; subject to `ignore_errors` and `run_on_error`.
    pub error: Option<HookError>,
    /// Short-circuit the run; subject to `run_on_bail`.
    pub bail: bool,
    /// Value the bailed call resolves with.
    pub bail_with: Option<Value>,
    /// Replacement arguments for the following node.
    pub using: Option<Vec<Value>>,
    /// Number of further nodes to pass over without invoking them.
    pub skip: usize,
}

impl NextOptions {
    /// Plain advance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals `error`.
    pub fn error(mut self, error: HookError) -> Self {
        self.error = Some(error);
        self
    }

    /// Requests a bail.
    pub fn bail(mut self) -> Self {
        self.bail = true;
        self
    }

    /// Requests a bail resolving with `value`.
    pub fn bail_with(mut self, value: Value) -> Self {
        self.bail = true;
        self.bail_with = Some(value);
        self
    }

    /// Replaces the arguments handed on.
    pub fn using(mut self, args: Vec<Value>) -> Self {
        self.using = Some(args);
        self
    }

    /// Passes over `times` further nodes.
    pub fn skip(mut self, times: usize) -> Self {
        self.skip = times;
        self
    }

    /// Options for a plain-return handler: `Null` forwards the chain
    /// arguments unchanged, anything else becomes the single argument.
    pub(crate) fn forwarding(value: Value) -> Self {
        match value {
            Value::Null => Self::default(),
            value => Self::default().using(vec![value]),
        }
    }
}

/// Continuation handle for one activation.
#[derive(Clone)]
pub struct Next {
    inner: Arc<ChainInner>,
    hook_type: HookType,
    position: usize,
    caller: Arc<HandlerDescriptor>,
    consumed: Arc<AtomicBool>,
    deferred: Arc<Mutex<Option<NextOptions>>>,
}

impl Next {
    pub(crate) fn new(
        inner: Arc<ChainInner>,
        hook_type: HookType,
        position: usize,
        caller: Arc<HandlerDescriptor>,
    ) -> Self {
        Self {
            inner,
            hook_type,
            position,
            caller,
            consumed: Arc::new(AtomicBool::new(false)),
            deferred: Arc::new(Mutex::new(None)),
        }
    }

    /// Which chain this handle advances.
    pub fn hook_type(&self) -> HookType {
        self.hook_type
    }

    /// Index of the calling handler in its list.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether [`next`](Self::next) defers the step until the calling
    /// handler returns instead of running the following nodes inline.
    ///
    /// True in async-mode chains. A deferred `next` returns `Ok(())` before
    /// the following nodes run, so their errors never reach the caller;
    /// use [`proceed`](Self::proceed) to see them.
    pub fn defers_next(&self) -> bool {
        self.inner.mode == ChainMode::Async
    }

    /// Whether the handle was already used.
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Acquire)
    }

    /// Consumes the handle.
    ///
    /// In a sync-mode chain the following nodes run before this returns,
    /// and an error they leave unrecovered is returned here. In an
    /// async-mode chain the request is recorded and carried out as soon as
    /// the calling handler returns; use [`proceed`](Self::proceed) to await
    /// the rest of the chain from inside an async handler instead.
    pub fn next(&self, options: NextOptions) -> HookResult<()> {
        self.claim()?;
        match self.inner.mode {
            ChainMode::Sync => self.step_sync(options),
            ChainMode::Async => {
                debug!(
                    operation = %self.inner.action,
                    hook_type = %self.hook_type,
                    correlation_id = %self.inner.correlation_id,
                    position = self.position,
                    "Deferring continuation until handler returns"
                );
                *self.deferred.lock() = Some(options);
                Ok(())
            }
        }
    }

    /// Consumes the handle and resolves once the following nodes settled.
    pub fn proceed(&self, options: NextOptions) -> BoxFuture<'static, HookResult<()>> {
        match self.inner.mode {
            ChainMode::Sync => futures::future::ready(self.next(options)).boxed(),
            ChainMode::Async => {
                let next = self.clone();
                async move {
                    next.claim()?;
                    next.step_async(options).await
                }
                .boxed()
            }
        }
    }

    /// `next` with no options.
    pub fn advance(&self) -> HookResult<()> {
        self.next(NextOptions::new())
    }

    /// Passes over `times` further nodes, forwarding the current arguments.
    pub fn skip(&self, times: usize) -> HookResult<()> {
        self.next(NextOptions::new().skip(times))
    }

    /// Passes over `times` further nodes, handing `args` to the node after
    /// them.
    pub fn skip_with(&self, times: usize, args: Vec<Value>) -> HookResult<()> {
        self.next(NextOptions::new().skip(times).using(args))
    }

    /// Short-circuits the run, optionally with a value.
    pub fn bail(&self, value: Option<Value>) -> HookResult<()> {
        let options = match value {
            Some(value) => NextOptions::new().bail_with(value),
            None => NextOptions::new().bail(),
        };
        self.next(options)
    }

    /// Signals an error.
    pub fn fail(&self, error: HookError) -> HookResult<()> {
        self.next(NextOptions::new().error(error))
    }

    pub(crate) fn claim(&self) -> HookResult<()> {
        if self.consumed.swap(true, Ordering::AcqRel) {
            return Err(HookError::protocol(format!(
                "continuation for '{}' ({} position {}) was already consumed",
                self.inner.action, self.hook_type, self.position
            )));
        }
        Ok(())
    }

    pub(crate) fn take_deferred(&self) -> Option<NextOptions> {
        self.deferred.lock().take()
    }

    /// Applies the step rules to `options`.
    fn resolve(&self, options: NextOptions) -> Move {
        match plan_step(&self.inner, self.hook_type, self.position, &self.caller, options) {
            Step::Finished => Move::Stop(Ok(())),
            Step::Propagate { error, silenced } => Move::Stop(Err(self.inner.handle_error(error, silenced))),
            Step::Bail(value) => {
                self.inner.bail(value);
                Move::Stop(Ok(()))
            }
            Step::Proceed {
                target,
                args,
                error,
            } => Move::To {
                target,
                args,
                error,
            },
        }
    }

    pub(crate) fn step_sync(&self, options: NextOptions) -> HookResult<()> {
        match self.resolve(options) {
            Move::Stop(outcome) => outcome,
            Move::To {
                target,
                args,
                error,
            } => activate_sync(&self.inner, self.hook_type, target, args, error),
        }
    }

    pub(crate) async fn step_async(&self, options: NextOptions) -> HookResult<()> {
        match self.resolve(options) {
            Move::Stop(outcome) => outcome,
            Move::To {
                target,
                args,
                error,
            } => activate_async(self.inner.clone(), self.hook_type, target, args, error).await,
        }
    }
}

/// Where the cursor goes once a step is planned.
enum Move {
    Stop(HookResult<()>),
    To {
        target: usize,
        args: Vec<Value>,
        error: Option<HookError>,
    },
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("action", &self.inner.action)
            .field("hook_type", &self.hook_type)
            .field("position", &self.position)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Activates the node at `index` and walks the list from there.
///
/// Nodes whose run conditions fail are passed over. Plain-return handlers
/// and deferred `next` requests are stepped by this loop; only a handler
/// that calls `next` inline nests a further walk. The terminal PRE
/// position runs the operation and enters POST; the terminal POST position
/// completes the run.
pub(crate) fn activate_sync(
    inner: &Arc<ChainInner>,
    mut hook_type: HookType,
    mut index: usize,
    mut args: Vec<Value>,
    mut error: Option<HookError>,
) -> HookResult<()> {
    loop {
        if inner.is_terminal() {
            return Ok(());
        }
        inner.set_chain_args(hook_type, args.clone());

        let list = inner.list(hook_type).clone();
        let Some(descriptor) = list.get(index).cloned() else {
            match hook_type {
                HookType::Pre => {
                    inner.run_original()?;
                    hook_type = HookType::Post;
                    index = 0;
                    args = inner.chain_args(HookType::Post);
                    error = None;
                    continue;
                }
                HookType::Post => {
                    inner.complete();
                    return Ok(());
                }
            }
        };

        if !run_conditions_pass(inner, hook_type, &descriptor, &args, error.as_ref()) {
            trace!(
                operation = %inner.action,
                hook_type = %hook_type,
                position = index,
                "Run condition failed; skipping handler"
            );
            index += 1;
            continue;
        }

        let Settlement::Step(next, options) =
            runner::invoke_sync(inner, hook_type, index, descriptor, args, error)?
        else {
            return Ok(());
        };
        match next.resolve(options) {
            Move::Stop(outcome) => return outcome,
            Move::To {
                target,
                args: forwarded,
                error: signalled,
            } => {
                index = target;
                args = forwarded;
                error = signalled;
            }
        }
    }
}

/// Async counterpart of [`activate_sync`].
pub(crate) fn activate_async(
    inner: Arc<ChainInner>,
    hook_type: HookType,
    index: usize,
    args: Vec<Value>,
    error: Option<HookError>,
) -> BoxFuture<'static, HookResult<()>> {
    async move {
        let (mut hook_type, mut index, mut args, mut error) = (hook_type, index, args, error);
        loop {
            if inner.is_terminal() {
                return Ok(());
            }
            inner.set_chain_args(hook_type, args.clone());

            let list = inner.list(hook_type).clone();
            let Some(descriptor) = list.get(index).cloned() else {
                match hook_type {
                    HookType::Pre => {
                        inner.run_original_async().await?;
                        hook_type = HookType::Post;
                        index = 0;
                        args = inner.chain_args(HookType::Post);
                        error = None;
                        continue;
                    }
                    HookType::Post => {
                        inner.complete();
                        return Ok(());
                    }
                }
            };

            if !run_conditions_pass(&inner, hook_type, &descriptor, &args, error.as_ref()) {
                trace!(
                    operation = %inner.action,
                    hook_type = %hook_type,
                    position = index,
                    "Run condition failed; skipping handler"
                );
                index += 1;
                continue;
            }

            let Settlement::Step(next, options) =
                runner::invoke_async(&inner, hook_type, index, descriptor, args, error).await?
            else {
                return Ok(());
            };
            match next.resolve(options) {
                Move::Stop(outcome) => return outcome,
                Move::To {
                    target,
                    args: forwarded,
                    error: signalled,
                } => {
                    index = target;
                    args = forwarded;
                    error = signalled;
                }
            }
        }
    }
    .boxed()
}
