//! Unified error types for hookchain.
//!
//! Handlers, wrapped operations, the registry, and the execution controller
//! all report failures as [`HookError`], so a chain can carry one error value
//! from the step that produced it to the caller of the wrapped operation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Categorization of every error a chain can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// An error signalled by a handler through `next` with an error set.
    /// Recoverable through `ignore_errors` or `run_on_error`.
    Handler,
    /// A handler returned `Err` outside the `next` contract.
    Unhandled,
    /// The wrapped operation itself failed.
    Operation,
    /// Invalid registration or invalid use of a chain (unknown event,
    /// sync start of an async chain, unknown operation name).
    Configuration,
    /// A continuation handle was used against the protocol.
    Protocol,
    /// The chain finished without reaching a terminal state.
    Stalled,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler => write!(f, "HANDLER"),
            Self::Unhandled => write!(f, "UNHANDLED"),
            Self::Operation => write!(f, "OPERATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Protocol => write!(f, "PROTOCOL"),
            Self::Stalled => write!(f, "STALLED"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The error type carried through hook chains.
///
/// Cloning keeps the underlying cause, so the error a handler passes to
/// `next` is the same value the caller eventually receives.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct HookError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl HookError {
    /// Create a new hook error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new hook error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Create a handler-signalled error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Handler, message)
    }

    /// Create an unhandled handler error.
    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unhandled, message)
    }

    /// Create a wrapped-operation error.
    pub fn operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Operation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a continuation protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Create a stalled-chain error.
    pub fn stalled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Stalled, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns whether this error can be recovered inside a chain.
    pub fn is_recoverable(&self) -> bool {
        self.kind == ErrorKind::Handler
    }
}

impl PartialEq for HookError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl From<serde_json::Error> for HookError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for HookError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
