//! Hook system: handlers, registration options, descriptors, and the registry.

pub mod descriptor;
pub mod handler;
pub mod options;
pub mod registry;
pub mod traits;

pub use descriptor::HandlerDescriptor;
pub use handler::{Handler, HandlerArg, IntoHandlers, Invocation};
pub use options::{HookOptions, ResolvedOptions, UseContext, Wrapper};
pub use registry::{EventHandlers, HookRegistry};
pub use traits::{AsyncHookHandler, SyncHookHandler};
