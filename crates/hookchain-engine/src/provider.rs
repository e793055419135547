//! Read-only views of a chain run handed to handlers and callbacks.
//!
//! A provider is a copy taken when a step is activated; mutating the run
//! afterwards does not change a provider a handler already holds.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use hookchain_core::time::TimeSnapshot;
use hookchain_core::{CorrelationId, HookError, HookType};

use crate::Value;
use crate::target::TargetHandle;

/// Snapshot of a run at one activation.
#[derive(Debug, Clone)]
pub struct HandlerProvider {
    pub(crate) action: Arc<str>,
    pub(crate) hook_type: HookType,
    pub(crate) instance: TargetHandle,
    pub(crate) surrogate: TargetHandle,
    pub(crate) original_args: Arc<[Value]>,
    pub(crate) current_args: Vec<Value>,
    pub(crate) received_args: Vec<Value>,
    pub(crate) result: Option<Value>,
    pub(crate) error: Option<HookError>,
    pub(crate) correlation_id: CorrelationId,
    pub(crate) time: TimeSnapshot,
    pub(crate) provide: Option<Value>,
}

impl HandlerProvider {
    /// Name of the wrapped operation.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Which chain this step belongs to.
    pub fn hook_type(&self) -> HookType {
        self.hook_type
    }

    /// The wrapped target.
    pub fn instance(&self) -> &TargetHandle {
        &self.instance
    }

    /// The wrapper handle.
    pub fn surrogate(&self) -> &TargetHandle {
        &self.surrogate
    }

    /// Arguments the operation was called with.
    pub fn original_args(&self) -> &[Value] {
        &self.original_args
    }

    /// The chain's current arguments.
    pub fn current_args(&self) -> &[Value] {
        &self.current_args
    }

    /// Arguments delivered to this step.
    pub fn received_args(&self) -> &[Value] {
        &self.received_args
    }

    /// The operation's result, once it has run.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// The error forwarded into this step, if any.
    pub fn error(&self) -> Option<&HookError> {
        self.error.as_ref()
    }

    /// Identifier shared by every step of this run.
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Time tracking at activation.
    pub fn time(&self) -> &TimeSnapshot {
        &self.time
    }

    /// The descriptor's opaque `provide` payload.
    pub fn provide(&self) -> Option<&Value> {
        self.provide.as_ref()
    }
}

/// View handed to `run_on_error` callbacks.
#[derive(Debug, Clone)]
pub struct ErrorProvider {
    view: HandlerProvider,
    error: HookError,
}

impl ErrorProvider {
    pub(crate) fn new(view: HandlerProvider, error: HookError) -> Self {
        Self { view, error }
    }

    /// The error under consideration.
    pub fn error(&self) -> &HookError {
        &self.error
    }
}

impl Deref for ErrorProvider {
    type Target = HandlerProvider;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

/// View handed to `run_on_bail` callbacks.
#[derive(Debug, Clone)]
pub struct BailProvider {
    view: HandlerProvider,
    bail_with: Option<Value>,
}

impl BailProvider {
    pub(crate) fn new(view: HandlerProvider, bail_with: Option<Value>) -> Self {
        Self { view, bail_with }
    }

    /// The value the bail would resolve with, if one was given.
    pub fn bail_with(&self) -> Option<&Value> {
        self.bail_with.as_ref()
    }
}

impl Deref for BailProvider {
    type Target = HandlerProvider;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

/// View handed to run-condition predicates.
///
/// Predicates of one `run_conditions` list run in order; a value passed
/// with [`pass_to_next_condition`](Self::pass_to_next_condition) is
/// delivered to the following predicate only, and never touches the chain
/// arguments.
#[derive(Debug)]
pub struct RunConditionProvider {
    view: HandlerProvider,
    received: Option<Value>,
    passed: Mutex<Option<Value>>,
}

impl RunConditionProvider {
    pub(crate) fn new(view: HandlerProvider, received: Option<Value>) -> Self {
        Self {
            view,
            received,
            passed: Mutex::new(None),
        }
    }

    /// Hands a value to the next predicate in the list.
    pub fn pass_to_next_condition(&self, value: Value) {
        *self.passed.lock() = Some(value);
    }

    /// Whether the previous predicate passed a value.
    pub fn did_receive_from_last_condition(&self) -> bool {
        self.received.is_some()
    }

    /// The value passed by the previous predicate.
    pub fn value_from_condition(&self) -> Option<&Value> {
        self.received.as_ref()
    }

    pub(crate) fn take_passed(&self) -> Option<Value> {
        self.passed.lock().take()
    }
}

impl Deref for RunConditionProvider {
    type Target = HandlerProvider;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}
