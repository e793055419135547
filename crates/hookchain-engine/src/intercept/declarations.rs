//! Process-wide per-type hook declarations.

use std::any::{TypeId, type_name};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::debug;

use crate::hooks::registry::HookRegistry;

type Declaration = Arc<dyn Fn(&HookRegistry) + Send + Sync>;

static DECLARATIONS: LazyLock<DashMap<TypeId, Vec<Declaration>>> = LazyLock::new(DashMap::new);

/// Records a registration callback run against the registry of every
/// [`Hooked<T>`](super::Hooked) built afterwards.
pub fn declare_hooks<T: 'static>(declaration: impl Fn(&HookRegistry) + Send + Sync + 'static) {
    DECLARATIONS
        .entry(TypeId::of::<T>())
        .or_default()
        .push(Arc::new(declaration));
    debug!(target_type = type_name::<T>(), "Hook declaration recorded");
}

/// Runs every declaration recorded for `T`; returns how many ran.
pub fn apply_declarations<T: 'static>(registry: &HookRegistry) -> usize {
    // Copied out so a declaration may itself declare without deadlocking.
    let declarations: Vec<Declaration> = DECLARATIONS
        .get(&TypeId::of::<T>())
        .map(|entry| entry.value().clone())
        .unwrap_or_default();

    for declaration in &declarations {
        declaration(registry);
    }
    declarations.len()
}

/// Drops every declaration recorded for `T`.
pub fn clear_declarations<T: 'static>() {
    DECLARATIONS.remove(&TypeId::of::<T>());
}
