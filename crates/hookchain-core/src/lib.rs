//! # hookchain-core
//!
//! Core crate for hookchain. Contains the unified error system,
//! configuration schemas, typed identifiers, the PRE/POST hook type,
//! and elapsed-time tracking used by every chain run.
//!
//! This crate has **no** internal dependencies on other hookchain crates.

pub mod config;
pub mod error;
pub mod result;
pub mod time;
pub mod types;

pub use error::{ErrorKind, HookError};
pub use result::HookResult;
pub use types::{CorrelationId, HookType, InstanceId};
