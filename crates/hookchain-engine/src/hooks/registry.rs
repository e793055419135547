//! Hook registry: handlers registered per operation with priority ordering.
//!
//! Each operation owns independent PRE and POST lists. A list is never
//! edited in place: every mutation builds a new list and swaps the `Arc`,
//! so chains already holding a snapshot are unaffected and handlers may
//! register or deregister re-entrantly while a chain runs.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use hookchain_core::config::chain::ChainConfig;
use hookchain_core::{HookError, HookResult, HookType};

use super::descriptor::HandlerDescriptor;
use super::handler::{Handler, IntoHandlers};
use super::options::HookOptions;

/// Ordered, shared snapshot of one hook-type list.
pub type DescriptorList = Arc<[Arc<HandlerDescriptor>]>;

fn empty_list() -> DescriptorList {
    Arc::from(Vec::new())
}

/// Snapshot of both lists for one operation.
#[derive(Debug, Clone)]
pub struct EventHandlers {
    /// PRE descriptors, highest priority first.
    pub pre: DescriptorList,
    /// POST descriptors, highest priority first.
    pub post: DescriptorList,
}

impl EventHandlers {
    /// A snapshot with no handlers.
    pub fn empty() -> Self {
        Self {
            pre: empty_list(),
            post: empty_list(),
        }
    }

    /// The list for one hook type.
    pub fn list(&self, hook_type: HookType) -> &DescriptorList {
        match hook_type {
            HookType::Pre => &self.pre,
            HookType::Post => &self.post,
        }
    }

    /// Whether neither list has handlers.
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }

    /// Total number of descriptors.
    pub fn len(&self) -> usize {
        self.pre.len() + self.post.len()
    }

    /// Whether any descriptor forces async execution.
    pub fn requires_async(&self) -> bool {
        self.pre
            .iter()
            .chain(self.post.iter())
            .any(|d| d.requires_async())
    }
}

impl Default for EventHandlers {
    fn default() -> Self {
        Self::empty()
    }
}

/// Registry-wide behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Priority for handlers registered without one.
    pub default_priority: i32,
    /// Whether rejected registrations are logged.
    pub warn_on_misconfiguration: bool,
    /// Whether chains built from this registry log unrecovered errors.
    pub log_errors: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::from(&ChainConfig::default())
    }
}

impl From<&ChainConfig> for RegistrySettings {
    fn from(config: &ChainConfig) -> Self {
        Self {
            default_priority: config.default_priority,
            warn_on_misconfiguration: config.warn_on_misconfiguration,
            log_errors: config.log_errors,
        }
    }
}

#[derive(Debug, Clone)]
struct OperationHooks {
    pre: DescriptorList,
    post: DescriptorList,
}

impl OperationHooks {
    fn new() -> Self {
        Self {
            pre: empty_list(),
            post: empty_list(),
        }
    }

    fn list_mut(&mut self, hook_type: HookType) -> &mut DescriptorList {
        match hook_type {
            HookType::Pre => &mut self.pre,
            HookType::Post => &mut self.post,
        }
    }

    fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

/// Registry of PRE/POST handlers organized by operation name.
#[derive(Debug)]
pub struct HookRegistry {
    /// Operation name → descriptor lists.
    operations: RwLock<HashMap<String, OperationHooks>>,
    /// Operations accepted for registration; `None` accepts any name.
    declared: Option<HashSet<String>>,
    /// Options merged beneath every registration.
    global: RwLock<HookOptions>,
    settings: RegistrySettings,
    sequence: AtomicU64,
    disposed: AtomicBool,
}

impl HookRegistry {
    /// Creates an empty registry accepting any operation name.
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    /// Creates an empty registry with explicit settings.
    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            operations: RwLock::new(HashMap::new()),
            declared: None,
            global: RwLock::new(HookOptions::default()),
            settings,
            sequence: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    /// Creates an empty registry configured from the `[chain]` section.
    pub fn from_config(config: &ChainConfig) -> Self {
        Self::with_settings(RegistrySettings::from(config))
    }

    /// Restricts registration to the named operations.
    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared = Some(operations.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the global options merged beneath every registration.
    pub fn with_global_options(self, options: HookOptions) -> Self {
        *self.global.write() = options;
        self
    }

    /// Replaces the global options. Only later registrations see the change.
    pub fn set_global_options(&self, options: HookOptions) {
        *self.global.write() = options;
    }

    /// Registry settings.
    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Whether `event` is accepted for registration.
    pub fn accepts(&self, event: &str) -> bool {
        !event.is_empty()
            && self
                .declared
                .as_ref()
                .is_none_or(|declared| declared.contains(event))
    }

    /// Registers handlers, degrading to a logged no-op on invalid input.
    pub fn register_hook(
        &self,
        event: &str,
        hook_type: HookType,
        handlers: impl IntoHandlers,
        options: HookOptions,
    ) -> &Self {
        if let Err(e) = self.try_register_hook(event, hook_type, handlers, options) {
            if self.settings.warn_on_misconfiguration {
                warn!(
                    event = %event,
                    hook_type = %hook_type,
                    error = %e,
                    "Ignoring invalid hook registration"
                );
            }
        }
        self
    }

    /// Registers handlers, returning a configuration error on invalid input.
    pub fn try_register_hook(
        &self,
        event: &str,
        hook_type: HookType,
        handlers: impl IntoHandlers,
        options: HookOptions,
    ) -> HookResult<&Self> {
        if self.is_disposed() {
            return Err(HookError::configuration(format!(
                "cannot register on '{event}': registry has been disposed"
            )));
        }
        if !self.accepts(event) {
            return Err(HookError::configuration(format!(
                "unknown operation '{event}'"
            )));
        }
        let handlers = handlers.into_handlers();
        if handlers.is_empty() {
            return Err(HookError::configuration(format!(
                "no handlers given for '{event}'"
            )));
        }

        let resolved = {
            let global = self.global.read();
            options.resolve(&global, self.settings.default_priority)
        };

        let mut operations = self.operations.write();
        let hooks = operations
            .entry(event.to_string())
            .or_insert_with(OperationHooks::new);
        let list = hooks.list_mut(hook_type);

        let mut next: Vec<Arc<HandlerDescriptor>> = list.iter().cloned().collect();
        for handler in handlers {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            next.push(Arc::new(HandlerDescriptor::new(
                sequence,
                event,
                handler,
                hook_type,
                resolved.clone(),
            )));
        }

        // Stable: equal priorities keep registration order.
        next.sort_by_key(|d| Reverse(d.priority()));
        let count = next.len();
        *list = Arc::from(next);

        info!(
            event = %event,
            hook_type = %hook_type,
            priority = resolved.priority,
            handler_count = count,
            "Hook handler registered"
        );

        Ok(self)
    }

    /// Registers PRE handlers.
    pub fn register_pre_hook(
        &self,
        event: &str,
        handlers: impl IntoHandlers,
        options: HookOptions,
    ) -> &Self {
        self.register_hook(event, HookType::Pre, handlers, options)
    }

    /// Registers POST handlers.
    pub fn register_post_hook(
        &self,
        event: &str,
        handlers: impl IntoHandlers,
        options: HookOptions,
    ) -> &Self {
        self.register_hook(event, HookType::Post, handlers, options)
    }

    /// Removes every PRE descriptor whose handler is `handler`.
    pub fn deregister_pre_hook(&self, event: &str, handler: &Handler) -> usize {
        self.deregister_handler(event, HookType::Pre, handler)
    }

    /// Removes every POST descriptor whose handler is `handler`.
    pub fn deregister_post_hook(&self, event: &str, handler: &Handler) -> usize {
        self.deregister_handler(event, HookType::Post, handler)
    }

    fn deregister_handler(&self, event: &str, hook_type: HookType, handler: &Handler) -> usize {
        let mut operations = self.operations.write();
        let Some(hooks) = operations.get_mut(event) else {
            return 0;
        };
        let list = hooks.list_mut(hook_type);
        let kept: Vec<Arc<HandlerDescriptor>> = list
            .iter()
            .filter(|d| !d.handler().same_as(handler))
            .cloned()
            .collect();
        let removed = list.len() - kept.len();
        if removed > 0 {
            *list = Arc::from(kept);
        }
        if hooks.is_empty() {
            operations.remove(event);
        }

        debug!(event = %event, hook_type = %hook_type, removed, "Hook handler deregistered");
        removed
    }

    /// Removes all PRE descriptors of an operation.
    pub fn deregister_pre_hooks(&self, event: &str) {
        self.clear_list(event, HookType::Pre);
    }

    /// Removes all POST descriptors of an operation.
    pub fn deregister_post_hooks(&self, event: &str) {
        self.clear_list(event, HookType::Post);
    }

    fn clear_list(&self, event: &str, hook_type: HookType) {
        let mut operations = self.operations.write();
        if let Some(hooks) = operations.get_mut(event) {
            *hooks.list_mut(hook_type) = empty_list();
            if hooks.is_empty() {
                operations.remove(event);
            }
        }
    }

    /// Removes both lists of an operation.
    pub fn deregister_hooks_for(&self, event: &str) {
        self.operations.write().remove(event);
        info!(event = %event, "All hooks deregistered for operation");
    }

    /// Removes every handler of every operation.
    pub fn deregister_hooks(&self) {
        self.operations.write().clear();
        info!("All hooks deregistered");
    }

    /// Clears all state. Later registrations are rejected.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.operations.write().clear();
        *self.global.write() = HookOptions::default();
        info!("Hook registry disposed");
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Snapshot of both lists for an operation.
    pub fn get_event_handlers(&self, event: &str) -> EventHandlers {
        let operations = self.operations.read();
        operations
            .get(event)
            .map(|hooks| EventHandlers {
                pre: hooks.pre.clone(),
                post: hooks.post.clone(),
            })
            .unwrap_or_default()
    }

    /// Whether any handlers are registered for an operation.
    pub fn has_handlers(&self, event: &str) -> bool {
        self.operations
            .read()
            .get(event)
            .is_some_and(|hooks| !hooks.is_empty())
    }

    /// Number of descriptors of one hook type on an operation.
    pub fn handler_count(&self, event: &str, hook_type: HookType) -> usize {
        self.get_event_handlers(event).list(hook_type).len()
    }

    /// Operations that currently have handlers.
    pub fn registered_events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.operations.read().keys().cloned().collect();
        events.sort();
        events
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
