//! Invokes one handler and settles its return.

use std::sync::Arc;

use tracing::trace;

use hookchain_core::{HookError, HookResult, HookType};

use super::controller::ChainInner;
use super::next::{Next, NextOptions};
use crate::Value;
use crate::hooks::descriptor::HandlerDescriptor;
use crate::hooks::handler::{Handler, HandlerArg, Invocation};
use crate::hooks::options::UseContext;

/// Builds the invocation in the fixed order
/// `[error] [next] [instance] [surrogate] ...values`.
fn assemble(
    inner: &ChainInner,
    hook_type: HookType,
    descriptor: &HandlerDescriptor,
    next: &Next,
    received: Vec<Value>,
    error: Option<HookError>,
) -> Invocation {
    let options = descriptor.options();
    let provider = inner.provider(hook_type, Some(descriptor), received.clone(), error.clone());
    let context = match &options.use_context {
        UseContext::Instance => inner.instance.clone(),
        UseContext::Surrogate => inner.surrogate.clone(),
        UseContext::Custom(handle) => handle.clone(),
    };

    let mut args = Vec::new();
    if !options.no_args {
        if options.pass_errors {
            args.push(HandlerArg::Error(error));
        }
        if options.use_next {
            args.push(HandlerArg::Next(next.clone()));
        }
        if options.pass_instance {
            args.push(HandlerArg::Instance(inner.instance.clone()));
        }
        if options.pass_surrogate {
            args.push(HandlerArg::Surrogate(inner.surrogate.clone()));
        }
        args.extend(received.into_iter().map(HandlerArg::Value));
    }

    Invocation::new(args, provider, context)
}

fn trace_invoke(inner: &ChainInner, hook_type: HookType, position: usize, descriptor: &HandlerDescriptor) {
    trace!(
        operation = %inner.action,
        hook_type = %hook_type,
        correlation_id = %inner.correlation_id,
        position,
        priority = descriptor.priority(),
        "Invoking handler"
    );
}

/// How an invocation left the chain.
pub(crate) enum Settlement {
    /// The handler drove its continuation itself, or left it unused.
    Settled,
    /// The cursor takes this step on behalf of the handler.
    Step(Next, NextOptions),
}

/// Runs a handler inline.
pub(crate) fn invoke_sync(
    inner: &Arc<ChainInner>,
    hook_type: HookType,
    position: usize,
    descriptor: Arc<HandlerDescriptor>,
    received: Vec<Value>,
    error: Option<HookError>,
) -> HookResult<Settlement> {
    let next = Next::new(inner.clone(), hook_type, position, descriptor.clone());
    let invocation = assemble(inner, hook_type, &descriptor, &next, received, error);
    trace_invoke(inner, hook_type, position, &descriptor);

    let outcome = match descriptor.handler() {
        Handler::Sync(handler) => handler(invocation),
        Handler::Async(_) => Err(HookError::configuration(format!(
            "async handler on '{}' reached a sync chain",
            inner.action
        ))),
    };

    settle(inner, &descriptor, next, outcome)
}

/// Runs a handler of either kind, awaiting async ones.
///
/// A sync continuation-style handler's `next` call comes back as a
/// [`Settlement::Step`] once the handler returns.
pub(crate) async fn invoke_async(
    inner: &Arc<ChainInner>,
    hook_type: HookType,
    position: usize,
    descriptor: Arc<HandlerDescriptor>,
    received: Vec<Value>,
    error: Option<HookError>,
) -> HookResult<Settlement> {
    let next = Next::new(inner.clone(), hook_type, position, descriptor.clone());
    let invocation = assemble(inner, hook_type, &descriptor, &next, received, error);
    trace_invoke(inner, hook_type, position, &descriptor);

    let outcome = match descriptor.handler() {
        Handler::Sync(handler) => handler(invocation),
        Handler::Async(handler) => {
            let pending = handler(invocation);
            pending.await
        }
    };

    settle(inner, &descriptor, next, outcome)
}

fn settle(
    inner: &ChainInner,
    descriptor: &HandlerDescriptor,
    next: Next,
    outcome: HookResult<Value>,
) -> HookResult<Settlement> {
    match outcome {
        Err(err) => Err(inner.handle_error(err, descriptor.options().silence_errors)),
        Ok(_) if descriptor.options().continuation_style() => Ok(match next.take_deferred() {
            Some(options) => Settlement::Step(next, options),
            None => Settlement::Settled,
        }),
        Ok(value) => {
            next.claim()?;
            Ok(Settlement::Step(next, NextOptions::forwarding(value)))
        }
    }
}
