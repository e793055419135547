//! Type-erased handles to the objects a chain runs against.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased reference to a target instance, a surrogate, or a
/// custom execution context.
#[derive(Clone)]
pub struct TargetHandle {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl TargetHandle {
    /// Wraps an owned value.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: type_name::<T>(),
        }
    }

    /// A handle carrying no object.
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Borrows the target as `T` if it has that type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns a shared pointer to the target as `T` if it has that type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Returns whether the handle holds a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Returns whether two handles point to the same object.
    pub fn ptr_eq(&self, other: &TargetHandle) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetHandle")
            .field("type_name", &self.type_name)
            .finish()
    }
}
