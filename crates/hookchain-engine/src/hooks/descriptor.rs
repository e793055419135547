//! Immutable registration record for one handler.

use hookchain_core::HookType;

use super::handler::Handler;
use super::options::{ResolvedOptions, Wrapper};

/// A registered `(handler, hook type, options)` tuple.
///
/// Descriptors are shared by `Arc` between the registry and any chain built
/// from it; they are never mutated after registration.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    sequence: u64,
    event: String,
    handler: Handler,
    hook_type: HookType,
    options: ResolvedOptions,
}

impl HandlerDescriptor {
    /// Creates a descriptor.
    pub fn new(
        sequence: u64,
        event: impl Into<String>,
        handler: Handler,
        hook_type: HookType,
        options: ResolvedOptions,
    ) -> Self {
        Self {
            sequence,
            event: event.into(),
            handler,
            hook_type,
            options,
        }
    }

    /// Registration sequence number within the owning registry.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Operation this descriptor is registered on.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// The handler callable.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// PRE or POST.
    pub fn hook_type(&self) -> HookType {
        self.hook_type
    }

    /// Merged options.
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Ordering priority.
    pub fn priority(&self) -> i32 {
        self.options.priority
    }

    /// Whether this descriptor forces its chain into async mode.
    pub fn requires_async(&self) -> bool {
        self.handler.is_async() || self.options.wrapper == Wrapper::Async
    }
}
