//! Chains with thousands of handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use hookchain_engine::prelude::*;

use crate::helpers::connection;

const DEPTH: usize = 5_000;

/// `DEPTH` plain-return handlers that bump `count` and forward the arguments.
fn plain_handlers(count: &Arc<AtomicUsize>) -> Vec<Handler> {
    (0..DEPTH)
        .map(|_| {
            let count = count.clone();
            Handler::new(move |_| {
                count.fetch_add(1, Ordering::Relaxed);
                Ok(Value::Null)
            })
        })
        .collect()
}

#[test]
fn test_sync_long_plain_chain_completes() {
    let conn = connection();
    let count = Arc::new(AtomicUsize::new(0));
    conn.registry()
        .register_pre_hook("connect", plain_handlers(&count), HookOptions::new().use_next(false))
        .register_post_hook("connect", plain_handlers(&count), HookOptions::new().no_args(true));

    let result = conn.call("connect", hook_args!["db"]).unwrap();
    assert_eq!(result, json!(["db"]));
    assert_eq!(count.load(Ordering::Relaxed), 2 * DEPTH);
    assert_eq!(conn.target().calls.entries(), vec!["connect"]);
}

#[tokio::test]
async fn test_async_long_plain_chain_completes() {
    let conn = connection();
    let count = Arc::new(AtomicUsize::new(0));
    conn.registry()
        .register_pre_hook("fetch", plain_handlers(&count), HookOptions::new().use_next(false))
        .register_post_hook("fetch", plain_handlers(&count), HookOptions::new().use_next(false));

    let result = conn.call_async("fetch", hook_args!["/a"]).await.unwrap();
    assert_eq!(result, json!(1));
    assert_eq!(count.load(Ordering::Relaxed), 2 * DEPTH);
}

#[tokio::test]
async fn test_async_long_chain_of_async_handlers_completes() {
    let conn = connection();
    let count = Arc::new(AtomicUsize::new(0));
    let handlers: Vec<Handler> = (0..DEPTH)
        .map(|_| {
            let count = count.clone();
            Handler::new_async(move |_| {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::Relaxed);
                    Ok::<_, HookError>(Value::Null)
                }
            })
        })
        .collect();
    conn.registry()
        .register_pre_hook("fetch", handlers.clone(), HookOptions::new().use_next(false))
        .register_post_hook("fetch", handlers, HookOptions::new().use_next(false));

    let result = conn.call_async("fetch", hook_args!["/a", "/b"]).await.unwrap();
    assert_eq!(result, json!(2));
    assert_eq!(count.load(Ordering::Relaxed), 2 * DEPTH);
}

#[tokio::test]
async fn test_async_long_chain_of_deferred_next_completes() {
    let conn = connection();
    let count = Arc::new(AtomicUsize::new(0));
    let handlers: Vec<Handler> = (0..DEPTH)
        .map(|_| {
            let count = count.clone();
            Handler::new(move |inv| {
                count.fetch_add(1, Ordering::Relaxed);
                inv.continuation()?.advance()?;
                Ok(Value::Null)
            })
        })
        .collect();
    conn.registry()
        .register_pre_hook("fetch", handlers.clone(), HookOptions::new())
        .register_post_hook("fetch", handlers, HookOptions::new());

    let result = conn.call_async("fetch", vec![]).await.unwrap();
    assert_eq!(result, json!(0));
    assert_eq!(count.load(Ordering::Relaxed), 2 * DEPTH);
}
