//! Shared identifier and classification types.

pub mod hook_type;
pub mod id;

pub use hook_type::HookType;
pub use id::{CorrelationId, InstanceId};
