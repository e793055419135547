//! hookchain demo
//!
//! Wraps a small connection target, attaches PRE/POST stages to its
//! operations, and runs them once synchronously and once asynchronously.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use tracing_subscriber::{EnvFilter, fmt};

use hookchain_core::config::EngineConfig;
use hookchain_engine::prelude::*;

/// Demo target: keeps the endpoints it connected to.
#[derive(Debug, Default)]
struct Connection {
    opened: Mutex<Vec<String>>,
}

impl Connection {
    fn connect(&self, args: Vec<Value>) -> HookResult<Value> {
        let host = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| HookError::operation("connect expects a host"))?;
        let port = args.get(1).and_then(Value::as_u64).unwrap_or(80);
        let endpoint = format!("{host}:{port}");
        self.opened.lock().push(endpoint.clone());
        Ok(Value::String(endpoint))
    }

    async fn fetch(self: Arc<Self>, args: Vec<Value>) -> HookResult<Value> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let path = args.first().and_then(Value::as_str).unwrap_or("/");
        let opened = self.opened.lock().len();
        Ok(serde_json::json!({ "path": path, "connections": opened }))
    }
}

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Demo failed: {e:#}");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> anyhow::Result<EngineConfig> {
    let env = std::env::var("HOOKCHAIN_ENV").unwrap_or_else(|_| "development".to_string());
    EngineConfig::load(&env).with_context(|| format!("loading configuration (env: {env})"))
}

/// Initialize tracing/logging
fn init_logging(config: &EngineConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: EngineConfig) -> anyhow::Result<()> {
    tracing::info!("Starting hookchain demo v{}", env!("CARGO_PKG_VERSION"));

    let connection = Hooked::builder(Connection::default())
        .config(&config.chain)
        .operation("connect", Connection::connect)
        .async_operation("fetch", Connection::fetch)
        .build();
    register_stages(connection.registry());

    let endpoint = connection.call("connect", hook_args!["db.local", 5432])?;
    tracing::info!(%endpoint, "connect returned");

    let cached = connection.call("connect", hook_args!["cache.local"])?;
    tracing::info!(%cached, "connect returned (bailed)");

    let page = connection.call_async("fetch", hook_args!["/status"]).await?;
    tracing::info!(%page, "fetch returned");

    let opened = connection.target().opened.lock().clone();
    tracing::info!(?opened, "Demo finished");
    Ok(())
}

fn register_stages(registry: &HookRegistry) {
    // Audit runs first; validation defaults the port.
    registry.register_pre_hook(
        "connect",
        Handler::new(|inv| {
            tracing::info!(
                correlation_id = %inv.provider().correlation_id(),
                args = ?inv.values(),
                "audit: connect requested"
            );
            inv.continuation()?.advance()?;
            Ok(Value::Null)
        }),
        HookOptions::new().priority(10),
    );

    registry.register_pre_hook(
        "connect",
        Handler::new(|inv| {
            let next = inv.continuation()?;
            match inv.value(0).and_then(Value::as_str) {
                Some(host) if host.starts_with("cache.") => {
                    next.bail(Some(Value::String(format!("{host}:cached"))))
                }
                Some(host) => {
                    let port = inv.value(1).cloned().unwrap_or_else(|| serde_json::json!(80));
                    next.next(NextOptions::new().using(vec![Value::String(host.to_string()), port]))
                }
                None => next.fail(HookError::handler("missing host")),
            }?;
            Ok(Value::Null)
        }),
        HookOptions::new().priority(5),
    );

    registry.register_post_hook(
        "connect",
        Handler::new(|inv| {
            tracing::info!(
                result = ?inv.provider().result(),
                elapsed_us = inv.provider().time().elapsed.as_micros() as u64,
                "audit: connect finished"
            );
            Ok(Value::Null)
        }),
        HookOptions::new().use_next(false),
    );

    registry.register_post_hook(
        "fetch",
        Handler::new_async(|inv| async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            tracing::info!(result = ?inv.provider().result(), "fetch post-processing");
            inv.continuation()?.proceed(NextOptions::new()).await?;
            Ok::<_, HookError>(Value::Null)
        }),
        HookOptions::new(),
    );
}
