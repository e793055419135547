//! Id-addressed registries of wrapped instances.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use hookchain_core::InstanceId;

use crate::hooks::registry::HookRegistry;

/// Map from instance id to that instance's registry.
///
/// Entries are removed only through [`dispose`](Self::dispose).
#[derive(Debug, Default)]
pub struct InstanceStore {
    entries: DashMap<InstanceId, Arc<HookRegistry>>,
}

impl InstanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn insert(&self, id: InstanceId, registry: Arc<HookRegistry>) {
        self.entries.insert(id, registry);
    }

    /// Looks up an instance's registry.
    pub fn get(&self, id: &InstanceId) -> Option<Arc<HookRegistry>> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Removes an entry and disposes its registry. Returns whether it existed.
    pub fn dispose(&self, id: &InstanceId) -> bool {
        match self.entries.remove(id) {
            Some((_, registry)) => {
                registry.dispose();
                debug!(instance_id = %id, "Instance disposed");
                true
            }
            None => false,
        }
    }

    /// Number of registries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no registries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
