//! Step rules applied each time a continuation is consumed.
//!
//! Error and bail rules read the options of the descriptor that called
//! `next`; run conditions belong to the node about to be activated.

use tracing::{debug, trace};

use hookchain_core::{HookError, HookType};

use super::controller::ChainInner;
use super::next::NextOptions;
use crate::Value;
use crate::hooks::descriptor::HandlerDescriptor;
use crate::provider::{BailProvider, ErrorProvider, RunConditionProvider};

/// What consuming a continuation resolves to.
#[derive(Debug)]
pub(crate) enum Step {
    /// The run already reached a terminal state; nothing to do.
    Finished,
    /// Fail the run with this error.
    Propagate { error: HookError, silenced: bool },
    /// Short-circuit the run.
    Bail(Option<Value>),
    /// Activate the node at `target` with these arguments.
    Proceed {
        target: usize,
        args: Vec<Value>,
        error: Option<HookError>,
    },
}

/// Outcome of the error rule.
enum ErrorOutcome {
    /// Caller ignores errors: keep going, forward the error to the next view.
    Ignored(HookError),
    /// A recovery callback accepted the error.
    Recovered,
    Propagate(HookError),
}

/// Plans the step for `caller` at `position` consuming `options`.
pub(crate) fn plan_step(
    inner: &ChainInner,
    hook_type: HookType,
    position: usize,
    caller: &HandlerDescriptor,
    options: NextOptions,
) -> Step {
    if inner.is_terminal() {
        return Step::Finished;
    }

    let NextOptions {
        error,
        bail,
        bail_with,
        using,
        skip,
    } = options;

    let args = using.unwrap_or_else(|| inner.chain_args(hook_type));
    let len = inner.list(hook_type).len();
    let target = position.saturating_add(1).saturating_add(skip).min(len);
    if skip > 0 {
        trace!(
            operation = %inner.action,
            hook_type = %hook_type,
            from = position,
            to = target,
            "Skipping handlers"
        );
    }

    let mut forwarded = None;
    if let Some(err) = error {
        match error_rule(inner, hook_type, caller, &args, err) {
            ErrorOutcome::Ignored(err) => forwarded = Some(err),
            ErrorOutcome::Recovered => {}
            ErrorOutcome::Propagate(err) => {
                return Step::Propagate {
                    error: err,
                    silenced: caller.options().silence_errors,
                };
            }
        }
    }

    if bail && !bail_vetoed(inner, hook_type, caller, &args, bail_with.as_ref()) {
        return Step::Bail(bail_with);
    }

    Step::Proceed {
        target,
        args,
        error: forwarded,
    }
}

fn error_rule(
    inner: &ChainInner,
    hook_type: HookType,
    caller: &HandlerDescriptor,
    args: &[Value],
    err: HookError,
) -> ErrorOutcome {
    let options = caller.options();
    if options.ignore_errors {
        debug!(
            operation = %inner.action,
            hook_type = %hook_type,
            correlation_id = %inner.correlation_id,
            error = %err,
            "Ignoring handler error"
        );
        return ErrorOutcome::Ignored(err);
    }

    if !options.run_on_error.is_empty() {
        let view = inner.provider(hook_type, Some(caller), args.to_vec(), Some(err.clone()));
        let provider = ErrorProvider::new(view, err.clone());
        if options.run_on_error.iter().any(|recover| recover(&provider)) {
            debug!(
                operation = %inner.action,
                hook_type = %hook_type,
                correlation_id = %inner.correlation_id,
                error = %err,
                "Handler error recovered"
            );
            return ErrorOutcome::Recovered;
        }
    }

    ErrorOutcome::Propagate(err)
}

fn bail_vetoed(
    inner: &ChainInner,
    hook_type: HookType,
    caller: &HandlerDescriptor,
    args: &[Value],
    bail_with: Option<&Value>,
) -> bool {
    let callbacks = &caller.options().run_on_bail;
    if callbacks.is_empty() {
        return false;
    }
    let view = inner.provider(hook_type, Some(caller), args.to_vec(), None);
    let provider = BailProvider::new(view, bail_with.cloned());
    let vetoed = callbacks.iter().any(|veto| veto(&provider));
    if vetoed {
        debug!(
            operation = %inner.action,
            hook_type = %hook_type,
            correlation_id = %inner.correlation_id,
            "Bail vetoed"
        );
    }
    vetoed
}

/// Evaluates the target node's run conditions in order.
///
/// A value passed by one predicate is handed to the next one only.
pub(crate) fn run_conditions_pass(
    inner: &ChainInner,
    hook_type: HookType,
    target: &HandlerDescriptor,
    received: &[Value],
    error: Option<&HookError>,
) -> bool {
    let conditions = &target.options().run_conditions;
    if conditions.is_empty() {
        return true;
    }

    let view = inner.provider(hook_type, Some(target), received.to_vec(), error.cloned());
    let mut passed = None;
    for condition in conditions {
        let provider = RunConditionProvider::new(view.clone(), passed.take());
        if !condition(&provider) {
            return false;
        }
        passed = provider.take_passed();
    }
    true
}
