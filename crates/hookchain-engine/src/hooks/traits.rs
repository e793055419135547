//! Trait-based handlers.
//!
//! Implement one of these instead of writing a closure when a handler
//! carries its own state.

use std::sync::Arc;

use async_trait::async_trait;

use hookchain_core::HookResult;

use super::handler::{Handler, Invocation};
use crate::Value;

/// A synchronous stage.
pub trait SyncHookHandler: Send + Sync {
    /// Handles one activation.
    fn handle(&self, invocation: Invocation) -> HookResult<Value>;
}

/// An asynchronous stage.
#[async_trait]
pub trait AsyncHookHandler: Send + Sync {
    /// Handles one activation.
    async fn handle(&self, invocation: Invocation) -> HookResult<Value>;
}

impl Handler {
    /// Adapts a [`SyncHookHandler`] into a registrable handler.
    pub fn from_sync_handler(handler: Arc<dyn SyncHookHandler>) -> Self {
        Self::new(move |invocation| handler.handle(invocation))
    }

    /// Adapts an [`AsyncHookHandler`] into a registrable handler.
    pub fn from_async_handler(handler: Arc<dyn AsyncHookHandler>) -> Self {
        Self::new_async(move |invocation| {
            let handler = handler.clone();
            async move { handler.handle(invocation).await }
        })
    }
}
