//! Execution controller: drives one invocation from the first PRE node to
//! resolution.
//!
//! ```text
//! created → running_pre → running_operation → running_post → completed
//!                 ↘ bailed / errored (from any running state)
//! ```
//!
//! The controller owns the argument snapshot, the captured result, the
//! correlation id, and the time tracker. Nodes reach it through the shared
//! [`ChainInner`]; the lock around the run is only ever held for short
//! reads and writes, never while a handler or the operation executes.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use hookchain_core::config::chain::ChainConfig;
use hookchain_core::time::{MonotonicTimeSource, TimeSnapshot, TimeSource, TimeTracker, time_source_for};
use hookchain_core::{CorrelationId, HookError, HookResult, HookType};

use super::next::{activate_async, activate_sync};
use super::operation::Operation;
use super::state::{ChainMode, ChainRun, ChainState};
use crate::Value;
use crate::hooks::descriptor::HandlerDescriptor;
use crate::hooks::registry::{DescriptorList, EventHandlers, HookRegistry};
use crate::provider::HandlerProvider;
use crate::target::TargetHandle;

const PHASE_PRE: &str = "pre";
const PHASE_OPERATION: &str = "operation";
const PHASE_POST: &str = "post";

/// Per-controller behaviour.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Whether unrecovered errors are logged before propagating.
    pub log_errors: bool,
    /// Clock for the run's time tracker.
    pub time_source: Arc<dyn TimeSource>,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            log_errors: true,
            time_source: Arc::new(MonotonicTimeSource::new()),
        }
    }
}

impl From<&ChainConfig> for ChainSettings {
    fn from(config: &ChainConfig) -> Self {
        Self {
            log_errors: config.log_errors,
            time_source: time_source_for(config.time_source),
        }
    }
}

/// State shared by the controller and every node of its run.
pub(crate) struct ChainInner {
    pub(crate) action: Arc<str>,
    pub(crate) instance: TargetHandle,
    pub(crate) surrogate: TargetHandle,
    pub(crate) handlers: EventHandlers,
    pub(crate) operation: Operation,
    pub(crate) mode: ChainMode,
    pub(crate) correlation_id: CorrelationId,
    pub(crate) original_args: Arc<[Value]>,
    log_errors: bool,
    run: Mutex<ChainRun>,
}

impl ChainInner {
    pub(crate) fn list(&self, hook_type: HookType) -> &DescriptorList {
        self.handlers.list(hook_type)
    }

    pub(crate) fn state(&self) -> ChainState {
        self.run.lock().state
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Arguments the given chain is currently carrying.
    pub(crate) fn chain_args(&self, hook_type: HookType) -> Vec<Value> {
        let run = self.run.lock();
        match hook_type {
            HookType::Pre => run.current_args.clone(),
            HookType::Post => run.post_args.clone(),
        }
    }

    /// Applies a `using` payload to the given chain.
    pub(crate) fn set_chain_args(&self, hook_type: HookType, args: Vec<Value>) {
        let mut run = self.run.lock();
        match hook_type {
            HookType::Pre => run.current_args = args,
            HookType::Post => run.post_args = args,
        }
    }

    /// Builds the read-only view for one activation.
    pub(crate) fn provider(
        &self,
        hook_type: HookType,
        descriptor: Option<&HandlerDescriptor>,
        received: Vec<Value>,
        error: Option<HookError>,
    ) -> HandlerProvider {
        let run = self.run.lock();
        let current_args = match hook_type {
            HookType::Pre => run.current_args.clone(),
            HookType::Post => run.post_args.clone(),
        };
        HandlerProvider {
            action: self.action.clone(),
            hook_type,
            instance: self.instance.clone(),
            surrogate: self.surrogate.clone(),
            original_args: self.original_args.clone(),
            current_args,
            received_args: received,
            result: run.result.clone(),
            error,
            correlation_id: self.correlation_id,
            time: run.timer.snapshot(),
            provide: descriptor.and_then(|d| d.options().provide.clone()),
        }
    }

    fn begin(&self) -> HookResult<Vec<Value>> {
        let mut run = self.run.lock();
        if run.state != ChainState::Created {
            return Err(HookError::protocol(format!(
                "controller for '{}' already started (state: {})",
                self.action, run.state
            )));
        }
        run.state = ChainState::RunningPre;
        run.timer.begin_phase(PHASE_PRE);
        Ok(run.current_args.clone())
    }

    /// Moves from the PRE chain to the operation; returns its arguments.
    fn begin_operation(&self) -> Vec<Value> {
        let mut run = self.run.lock();
        run.state = ChainState::RunningOperation;
        run.timer.end_phase(PHASE_PRE);
        run.timer.begin_phase(PHASE_OPERATION);
        run.current_args.clone()
    }

    /// Captures the operation outcome and moves on to the POST chain.
    fn finish_operation(&self, outcome: HookResult<Value>) -> HookResult<()> {
        match outcome {
            Ok(value) => {
                let mut run = self.run.lock();
                if run.state.is_terminal() {
                    return Ok(());
                }
                run.result = Some(value);
                run.state = ChainState::RunningPost;
                run.timer.end_phase(PHASE_OPERATION);
                run.timer.begin_phase(PHASE_POST);
                Ok(())
            }
            Err(e) => Err(self.handle_error(e, false)),
        }
    }

    /// Runs the wrapped operation with the current arguments (sync mode).
    pub(crate) fn run_original(&self) -> HookResult<()> {
        let args = self.begin_operation();
        debug!(operation = %self.action, correlation_id = %self.correlation_id, "Running wrapped operation");
        let outcome = match &self.operation {
            Operation::Sync(body) => body(args),
            Operation::Async(_) => Err(HookError::configuration(format!(
                "operation '{}' is async and cannot run in a sync chain",
                self.action
            ))),
        };
        self.finish_operation(outcome)
    }

    /// Runs the wrapped operation with the current arguments (async mode).
    pub(crate) async fn run_original_async(&self) -> HookResult<()> {
        let args = self.begin_operation();
        debug!(operation = %self.action, correlation_id = %self.correlation_id, "Running wrapped operation");
        let outcome = match &self.operation {
            Operation::Sync(body) => body(args),
            Operation::Async(body) => body(args).await,
        };
        self.finish_operation(outcome)
    }

    /// Short-circuits the run. Resolves with `bail_with`, else the last
    /// captured value.
    pub(crate) fn bail(&self, bail_with: Option<Value>) {
        let mut run = self.run.lock();
        if run.state.is_terminal() {
            return;
        }
        let value = bail_with.or_else(|| run.result.clone()).unwrap_or(Value::Null);
        debug!(
            operation = %self.action,
            correlation_id = %self.correlation_id,
            from = %run.state,
            "Chain bailed"
        );
        run.bail_value = Some(value);
        run.state = ChainState::Bailed;
        run.timer.finish();
    }

    /// Resolves the run with the captured result.
    pub(crate) fn complete(&self) {
        let mut run = self.run.lock();
        if run.state.is_terminal() {
            return;
        }
        run.state = ChainState::Completed;
        run.timer.finish();
        debug!(
            operation = %self.action,
            correlation_id = %self.correlation_id,
            elapsed_us = run.timer.elapsed().as_micros() as u64,
            "Chain completed"
        );
    }

    /// Fails the run. The first recorded error wins; later calls return it.
    pub(crate) fn handle_error(&self, err: HookError, silenced: bool) -> HookError {
        let mut run = self.run.lock();
        if run.errored() {
            if let Some(existing) = &run.error {
                return existing.clone();
            }
        }
        let from = run.state;
        run.state = ChainState::Errored;
        run.error = Some(err.clone());
        run.timer.finish();
        drop(run);

        if self.log_errors && !silenced {
            error!(
                operation = %self.action,
                correlation_id = %self.correlation_id,
                kind = %err.kind,
                from = %from,
                error = %err.message,
                "Hook chain failed"
            );
        }
        err
    }

    /// Outcome once driving has returned.
    fn outcome(&self, driven: HookResult<()>) -> HookResult<Value> {
        let state = {
            let run = self.run.lock();
            match run.state {
                ChainState::Completed => return Ok(run.result.clone().unwrap_or(Value::Null)),
                ChainState::Bailed => return Ok(run.bail_value.clone().unwrap_or(Value::Null)),
                ChainState::Errored => {
                    if let Some(err) = &run.error {
                        return Err(err.clone());
                    }
                }
                _ => {}
            }
            run.state
        };

        let err = match driven {
            Err(e) => e,
            Ok(()) => HookError::stalled(format!(
                "chain for '{}' stopped in state {state}: a handler returned without calling next",
                self.action
            )),
        };
        Err(self.handle_error(err, false))
    }
}

/// Starts and resolves one invocation of a wrapped operation.
pub struct ExecutionController {
    inner: Arc<ChainInner>,
}

impl ExecutionController {
    /// Starts building a controller for an operation.
    pub fn builder(action: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder::new(action)
    }

    /// Name of the wrapped operation.
    pub fn action(&self) -> &str {
        &self.inner.action
    }

    /// Sync or async.
    pub fn mode(&self) -> ChainMode {
        self.inner.mode
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChainState {
        self.inner.state()
    }

    /// Identifier shared by every step of this run.
    pub fn correlation_id(&self) -> CorrelationId {
        self.inner.correlation_id
    }

    /// Time tracking so far.
    pub fn time(&self) -> TimeSnapshot {
        self.inner.run.lock().timer.snapshot()
    }

    /// Runs a sync-mode chain to resolution.
    ///
    /// Returns the operation result, the bail value, or the unrecovered
    /// error. Async-mode chains are rejected with a configuration error.
    pub fn start(&self) -> HookResult<Value> {
        if self.inner.mode == ChainMode::Async {
            return Err(HookError::configuration(format!(
                "chain for '{}' contains async handlers or an async operation; use start_async",
                self.inner.action
            )));
        }
        let args = self.inner.begin()?;
        self.trace_start();
        let driven = activate_sync(&self.inner, HookType::Pre, 0, args, None);
        self.inner.outcome(driven)
    }

    /// Runs a chain of either mode to resolution.
    pub async fn start_async(&self) -> HookResult<Value> {
        let args = self.inner.begin()?;
        self.trace_start();
        let driven = activate_async(self.inner.clone(), HookType::Pre, 0, args, None).await;
        self.inner.outcome(driven)
    }

    fn trace_start(&self) {
        debug!(
            operation = %self.inner.action,
            correlation_id = %self.inner.correlation_id,
            mode = ?self.inner.mode,
            pre = self.inner.handlers.pre.len(),
            post = self.inner.handlers.post.len(),
            "Starting hook chain"
        );
    }
}

impl fmt::Debug for ExecutionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionController")
            .field("action", &self.inner.action)
            .field("mode", &self.inner.mode)
            .field("state", &self.inner.state())
            .field("correlation_id", &self.inner.correlation_id)
            .finish()
    }
}

/// Builder for [`ExecutionController`].
///
/// The wrapping layer supplies the target instance, its wrapper handle, the
/// bound operation, and the call arguments.
pub struct ControllerBuilder {
    action: String,
    instance: TargetHandle,
    surrogate: Option<TargetHandle>,
    handlers: EventHandlers,
    operation: Option<Operation>,
    args: Vec<Value>,
    settings: ChainSettings,
    correlation_id: Option<CorrelationId>,
}

impl ControllerBuilder {
    fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            instance: TargetHandle::empty(),
            surrogate: None,
            handlers: EventHandlers::empty(),
            operation: None,
            args: Vec::new(),
            settings: ChainSettings::default(),
            correlation_id: None,
        }
    }

    /// Target instance the operation belongs to.
    pub fn instance(mut self, instance: TargetHandle) -> Self {
        self.instance = instance;
        self
    }

    /// Wrapper handle; defaults to the instance.
    pub fn surrogate(mut self, surrogate: TargetHandle) -> Self {
        self.surrogate = Some(surrogate);
        self
    }

    /// Explicit handler snapshot.
    pub fn handlers(mut self, handlers: EventHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Snapshots the registry's handlers for this operation and adopts its
    /// error-logging setting.
    pub fn registry(mut self, registry: &HookRegistry) -> Self {
        self.handlers = registry.get_event_handlers(&self.action);
        self.settings.log_errors &= registry.settings().log_errors;
        self
    }

    /// The bound operation body.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Call arguments.
    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Controller settings.
    pub fn settings(mut self, settings: ChainSettings) -> Self {
        let log_errors = self.settings.log_errors && settings.log_errors;
        self.settings = ChainSettings {
            log_errors,
            ..settings
        };
        self
    }

    /// Fixed correlation id instead of a generated one.
    pub fn correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Builds the controller. Fails when no operation was given.
    pub fn build(self) -> HookResult<ExecutionController> {
        let operation = self.operation.ok_or_else(|| {
            HookError::configuration(format!("no operation bound for '{}'", self.action))
        })?;
        let mode = if operation.is_async() || self.handlers.requires_async() {
            ChainMode::Async
        } else {
            ChainMode::Sync
        };
        let correlation_id = self.correlation_id.unwrap_or_default();
        let timer = TimeTracker::start(self.settings.time_source.clone());
        let surrogate = self.surrogate.unwrap_or_else(|| self.instance.clone());

        info!(
            operation = %self.action,
            correlation_id = %correlation_id,
            mode = ?mode,
            "Execution controller created"
        );

        Ok(ExecutionController {
            inner: Arc::new(ChainInner {
                action: Arc::from(self.action),
                instance: self.instance,
                surrogate,
                handlers: self.handlers,
                operation,
                mode,
                correlation_id,
                original_args: Arc::from(self.args.clone()),
                log_errors: self.settings.log_errors,
                run: Mutex::new(ChainRun::new(self.args, timer)),
            }),
        })
    }
}
