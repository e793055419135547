//! Convenience result type alias for hookchain.

use crate::error::HookError;

/// A specialized `Result` type for hook chain operations.
///
/// Handlers, operations, and controllers all return this so that errors
/// flow through `?` without spelling out `Result<T, HookError>`.
pub type HookResult<T> = Result<T, HookError>;
