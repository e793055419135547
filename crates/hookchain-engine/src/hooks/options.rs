//! Registration options and their merge into resolved descriptor options.
//!
//! [`HookOptions`] is the partial form given at registration (and as the
//! registry-wide global options); [`ResolvedOptions`] is the concrete form a
//! descriptor carries after merging.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Value;
use crate::provider::{BailProvider, ErrorProvider, RunConditionProvider};
use crate::target::TargetHandle;

/// Predicate gating whether a handler runs at a given step.
pub type RunCondition = Arc<dyn Fn(&RunConditionProvider) -> bool + Send + Sync>;

/// Callback deciding whether a signalled error is recovered.
pub type ErrorRecovery = Arc<dyn Fn(&ErrorProvider) -> bool + Send + Sync>;

/// Callback deciding whether a bail is vetoed.
pub type BailRecovery = Arc<dyn Fn(&BailProvider) -> bool + Send + Sync>;

/// How the runner drives a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrapper {
    /// Called inline.
    #[default]
    Sync,
    /// Driven through the async runner; the whole chain runs in async mode.
    Async,
}

/// Object a handler sees as its execution context.
#[derive(Clone, Default)]
pub enum UseContext {
    /// The wrapped target.
    #[default]
    Instance,
    /// The wrapper handle.
    Surrogate,
    /// An arbitrary caller-supplied object.
    Custom(TargetHandle),
}

impl fmt::Debug for UseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => write!(f, "Instance"),
            Self::Surrogate => write!(f, "Surrogate"),
            Self::Custom(h) => write!(f, "Custom({})", h.type_name()),
        }
    }
}

/// Partial options given at registration.
///
/// Unset scalars fall back to the global options, then to the built-in
/// defaults. Callback lists are concatenated, global callbacks first.
#[derive(Clone, Default)]
pub struct HookOptions {
    priority: Option<i32>,
    use_next: Option<bool>,
    no_args: Option<bool>,
    pass_instance: Option<bool>,
    pass_surrogate: Option<bool>,
    pass_errors: Option<bool>,
    ignore_errors: Option<bool>,
    silence_errors: Option<bool>,
    wrapper: Option<Wrapper>,
    use_context: Option<UseContext>,
    run_conditions: Vec<RunCondition>,
    run_on_error: Vec<ErrorRecovery>,
    run_on_bail: Vec<BailRecovery>,
    provide: Option<Value>,
}

impl HookOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Higher runs first; ties keep registration order.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Whether the handler receives a continuation handle.
    pub fn use_next(mut self, use_next: bool) -> Self {
        self.use_next = Some(use_next);
        self
    }

    /// Call the handler with no arguments at all.
    pub fn no_args(mut self, no_args: bool) -> Self {
        self.no_args = Some(no_args);
        self
    }

    /// Prepend the target instance.
    pub fn pass_instance(mut self, pass: bool) -> Self {
        self.pass_instance = Some(pass);
        self
    }

    /// Prepend the wrapper handle.
    pub fn pass_surrogate(mut self, pass: bool) -> Self {
        self.pass_surrogate = Some(pass);
        self
    }

    /// Prepend the forwarded error slot.
    pub fn pass_errors(mut self, pass: bool) -> Self {
        self.pass_errors = Some(pass);
        self
    }

    /// Errors this handler signals through `next` are cleared instead of
    /// propagated.
    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = Some(ignore);
        self
    }

    /// Errors this handler causes are not logged before propagating.
    pub fn silence_errors(mut self, silence: bool) -> Self {
        self.silence_errors = Some(silence);
        self
    }

    /// Sync or async driving strategy.
    pub fn wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    /// Execution context exposed through `Invocation::context`.
    pub fn use_context(mut self, context: UseContext) -> Self {
        self.use_context = Some(context);
        self
    }

    /// Adds a run condition. Every condition must pass for the handler to run.
    pub fn run_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&RunConditionProvider) -> bool + Send + Sync + 'static,
    {
        self.run_conditions.push(Arc::new(condition));
        self
    }

    /// Adds an error recovery callback.
    pub fn run_on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ErrorProvider) -> bool + Send + Sync + 'static,
    {
        self.run_on_error.push(Arc::new(callback));
        self
    }

    /// Adds a bail veto callback.
    pub fn run_on_bail<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BailProvider) -> bool + Send + Sync + 'static,
    {
        self.run_on_bail.push(Arc::new(callback));
        self
    }

    /// Opaque payload exposed to providers.
    pub fn provide(mut self, value: Value) -> Self {
        self.provide = Some(value);
        self
    }

    /// Merges these per-handler options over `global`.
    pub fn resolve(&self, global: &HookOptions, default_priority: i32) -> ResolvedOptions {
        fn pick<T: Clone>(local: &Option<T>, global: &Option<T>, fallback: T) -> T {
            local.clone().or_else(|| global.clone()).unwrap_or(fallback)
        }

        fn concat<T: Clone>(global: &[T], local: &[T]) -> Vec<T> {
            global.iter().chain(local.iter()).cloned().collect()
        }

        ResolvedOptions {
            priority: pick(&self.priority, &global.priority, default_priority),
            use_next: pick(&self.use_next, &global.use_next, true),
            no_args: pick(&self.no_args, &global.no_args, false),
            pass_instance: pick(&self.pass_instance, &global.pass_instance, false),
            pass_surrogate: pick(&self.pass_surrogate, &global.pass_surrogate, false),
            pass_errors: pick(&self.pass_errors, &global.pass_errors, false),
            ignore_errors: pick(&self.ignore_errors, &global.ignore_errors, false),
            silence_errors: pick(&self.silence_errors, &global.silence_errors, false),
            wrapper: pick(&self.wrapper, &global.wrapper, Wrapper::Sync),
            use_context: pick(&self.use_context, &global.use_context, UseContext::Instance),
            run_conditions: concat(&global.run_conditions, &self.run_conditions),
            run_on_error: concat(&global.run_on_error, &self.run_on_error),
            run_on_bail: concat(&global.run_on_bail, &self.run_on_bail),
            provide: self.provide.clone().or_else(|| global.provide.clone()),
        }
    }
}

impl fmt::Debug for HookOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookOptions")
            .field("priority", &self.priority)
            .field("use_next", &self.use_next)
            .field("wrapper", &self.wrapper)
            .field("run_conditions", &self.run_conditions.len())
            .field("run_on_error", &self.run_on_error.len())
            .field("run_on_bail", &self.run_on_bail.len())
            .finish_non_exhaustive()
    }
}

/// Concrete options carried by a descriptor.
#[derive(Clone)]
pub struct ResolvedOptions {
    /// Ordering priority; higher runs first.
    pub priority: i32,
    /// Whether a continuation handle is passed.
    pub use_next: bool,
    /// Whether the argument list is forced empty.
    pub no_args: bool,
    /// Whether the instance is prepended.
    pub pass_instance: bool,
    /// Whether the surrogate is prepended.
    pub pass_surrogate: bool,
    /// Whether the error slot is prepended.
    pub pass_errors: bool,
    /// Whether errors signalled by this handler are cleared.
    pub ignore_errors: bool,
    /// Whether error logging is suppressed for this handler.
    pub silence_errors: bool,
    /// Driving strategy.
    pub wrapper: Wrapper,
    /// Execution context selection.
    pub use_context: UseContext,
    /// Run conditions, all of which must pass.
    pub run_conditions: Vec<RunCondition>,
    /// Error recovery callbacks.
    pub run_on_error: Vec<ErrorRecovery>,
    /// Bail veto callbacks.
    pub run_on_bail: Vec<BailRecovery>,
    /// Opaque provider payload.
    pub provide: Option<Value>,
}

impl ResolvedOptions {
    /// Whether the handler is driven continuation-style.
    pub fn continuation_style(&self) -> bool {
        self.use_next && !self.no_args
    }
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        HookOptions::default().resolve(&HookOptions::default(), 0)
    }
}

impl fmt::Debug for ResolvedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOptions")
            .field("priority", &self.priority)
            .field("use_next", &self.use_next)
            .field("no_args", &self.no_args)
            .field("pass_instance", &self.pass_instance)
            .field("pass_surrogate", &self.pass_surrogate)
            .field("pass_errors", &self.pass_errors)
            .field("ignore_errors", &self.ignore_errors)
            .field("silence_errors", &self.silence_errors)
            .field("wrapper", &self.wrapper)
            .field("use_context", &self.use_context)
            .field("run_conditions", &self.run_conditions.len())
            .field("run_on_error", &self.run_on_error.len())
            .field("run_on_bail", &self.run_on_bail.len())
            .field("provide", &self.provide)
            .finish()
    }
}
