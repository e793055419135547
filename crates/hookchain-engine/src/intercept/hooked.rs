//! Wrapper routing a target's named operations through hook chains.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info};

use hookchain_core::config::chain::ChainConfig;
use hookchain_core::{HookError, HookResult, InstanceId};

use super::declarations::apply_declarations;
use super::store::InstanceStore;
use crate::Value;
use crate::chain::controller::{ChainSettings, ExecutionController};
use crate::chain::operation::Operation;
use crate::hooks::registry::HookRegistry;
use crate::target::TargetHandle;

type SyncBody<T> = dyn Fn(&T, Vec<Value>) -> HookResult<Value> + Send + Sync;
type AsyncBody<T> = dyn Fn(Arc<T>, Vec<Value>) -> BoxFuture<'static, HookResult<Value>> + Send + Sync;

enum BoundOperation<T> {
    Sync(Arc<SyncBody<T>>),
    Async(Arc<AsyncBody<T>>),
}

impl<T> Clone for BoundOperation<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(body) => Self::Sync(body.clone()),
            Self::Async(body) => Self::Async(body.clone()),
        }
    }
}

struct HookedInner<T> {
    id: InstanceId,
    target: Arc<T>,
    registry: Arc<HookRegistry>,
    operations: HashMap<String, BoundOperation<T>>,
    settings: ChainSettings,
}

/// A target whose operations run inside hook chains.
///
/// Cloning is cheap and shares the target and registry. A clone is what
/// handlers see as the surrogate.
pub struct Hooked<T> {
    inner: Arc<HookedInner<T>>,
}

impl<T> Clone for Hooked<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Hooked<T> {
    /// Starts wrapping `target`.
    pub fn builder(target: T) -> HookedBuilder<T> {
        HookedBuilder::new(Arc::new(target))
    }

    /// Starts wrapping an already shared target.
    pub fn builder_from_arc(target: Arc<T>) -> HookedBuilder<T> {
        HookedBuilder::new(target)
    }

    /// Store key of this wrapper.
    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    /// The wrapped target.
    pub fn target(&self) -> &Arc<T> {
        &self.inner.target
    }

    /// The registry hooks are registered on.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.inner.registry
    }

    /// Whether `name` is a wrapped operation.
    pub fn has_operation(&self, name: &str) -> bool {
        self.inner.operations.contains_key(name)
    }

    /// Names of the wrapped operations, sorted.
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.operations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Prepares a controller for one call of `name`.
    pub fn controller(&self, name: &str, args: Vec<Value>) -> HookResult<ExecutionController> {
        let bound = self.inner.operations.get(name).ok_or_else(|| {
            HookError::configuration(format!(
                "'{}' has no operation named '{name}'",
                std::any::type_name::<T>()
            ))
        })?;

        let operation = match bound.clone() {
            BoundOperation::Sync(body) => {
                let target = self.inner.target.clone();
                Operation::new(move |args| body(&target, args))
            }
            BoundOperation::Async(body) => {
                let target = self.inner.target.clone();
                Operation::Async(Arc::new(move |args| body(target.clone(), args)))
            }
        };

        ExecutionController::builder(name)
            .instance(TargetHandle::from_arc(self.inner.target.clone()))
            .surrogate(TargetHandle::new(self.clone()))
            .registry(&self.inner.registry)
            .settings(self.inner.settings.clone())
            .operation(operation)
            .args(args)
            .build()
    }

    /// Calls `name` through its hook chains.
    ///
    /// Only valid when every handler and the operation are synchronous;
    /// otherwise use [`call_async`](Self::call_async).
    pub fn call(&self, name: &str, args: Vec<Value>) -> HookResult<Value> {
        self.controller(name, args)?.start()
    }

    /// Calls `name` through its hook chains, awaiting async stages.
    pub async fn call_async(&self, name: &str, args: Vec<Value>) -> HookResult<Value> {
        self.controller(name, args)?.start_async().await
    }
}

impl<T> fmt::Debug for Hooked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooked")
            .field("id", &self.inner.id)
            .field("target", &std::any::type_name::<T>())
            .field("operations", &self.inner.operations.len())
            .finish()
    }
}

/// Builder for [`Hooked`].
pub struct HookedBuilder<T> {
    target: Arc<T>,
    operations: HashMap<String, BoundOperation<T>>,
    registry: Option<Arc<HookRegistry>>,
    config: ChainConfig,
    settings: Option<ChainSettings>,
    store: Option<Arc<InstanceStore>>,
}

impl<T: Send + Sync + 'static> HookedBuilder<T> {
    fn new(target: Arc<T>) -> Self {
        Self {
            target,
            operations: HashMap::new(),
            registry: None,
            config: ChainConfig::default(),
            settings: None,
            store: None,
        }
    }

    /// Wraps a synchronous operation.
    pub fn operation<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&T, Vec<Value>) -> HookResult<Value> + Send + Sync + 'static,
    {
        self.operations
            .insert(name.into(), BoundOperation::Sync(Arc::new(body)));
        self
    }

    /// Wraps an asynchronous operation.
    pub fn async_operation<F, Fut>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arc<T>, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<Value>> + Send + 'static,
    {
        self.operations.insert(
            name.into(),
            BoundOperation::Async(Arc::new(move |target, args| body(target, args).boxed())),
        );
        self
    }

    /// Uses an existing registry instead of creating one.
    pub fn registry(mut self, registry: Arc<HookRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Chain configuration for the created registry and controllers.
    pub fn config(mut self, config: &ChainConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Controller settings; defaults follow the chain configuration.
    pub fn settings(mut self, settings: ChainSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Records the built wrapper's registry in `store`.
    pub fn store(mut self, store: Arc<InstanceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the wrapper and applies the hook declarations for `T`.
    pub fn build(self) -> Hooked<T> {
        let registry = self.registry.unwrap_or_else(|| {
            Arc::new(
                HookRegistry::from_config(&self.config)
                    .with_operations(self.operations.keys().cloned()),
            )
        });
        let applied = apply_declarations::<T>(&registry);
        let id = InstanceId::new();

        if let Some(store) = &self.store {
            store.insert(id, registry.clone());
        }

        let settings = self
            .settings
            .unwrap_or_else(|| ChainSettings::from(&self.config));

        info!(
            instance_id = %id,
            target = std::any::type_name::<T>(),
            operations = self.operations.len(),
            declarations = applied,
            "Hooked instance created"
        );
        debug!(instance_id = %id, "Hooked instance registry ready");

        Hooked {
            inner: Arc::new(HookedInner {
                id,
                target: self.target,
                registry,
                operations: self.operations,
                settings,
            }),
        }
    }
}
