//! Async-mode chains.

use std::sync::Arc;

use serde_json::json;

use hookchain_engine::prelude::*;

use crate::helpers::{Recorder, connection};

#[tokio::test]
async fn test_async_post_rejection_is_returned() {
    let conn = connection();
    conn.registry().register_post_hook(
        "fetch",
        Handler::new_async(|_| async { Err::<Value, _>(HookError::handler("post rejected")) }),
        HookOptions::new().silence_errors(true),
    );

    let err = conn.call_async("fetch", vec![]).await.unwrap_err();
    assert_eq!(err, HookError::handler("post rejected"));
    assert_eq!(conn.target().calls.entries(), vec!["fetch"]);
}

#[tokio::test]
async fn test_async_wrapped_post_rejection_is_returned() {
    let conn = connection();
    conn.registry().register_post_hook(
        "connect",
        Handler::new(|_| Err(HookError::handler("wrapped rejection"))),
        HookOptions::new().wrapper(Wrapper::Async).silence_errors(true),
    );

    let err = conn.call_async("connect", hook_args!["db"]).await.unwrap_err();
    assert_eq!(err, HookError::handler("wrapped rejection"));
}

#[tokio::test]
async fn test_async_chain_keeps_order() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry()
        .register_pre_hook("fetch", log.async_step("async-pre"), HookOptions::new().priority(1))
        .register_pre_hook("fetch", log.step("sync-pre"), HookOptions::new())
        .register_post_hook("fetch", log.async_step("async-post"), HookOptions::new());

    let result = conn.call_async("fetch", hook_args!["/a", "/b"]).await.unwrap();
    assert_eq!(result, json!(2));
    assert_eq!(log.entries(), vec!["async-pre", "sync-pre", "fetch", "async-post"]);
}

#[tokio::test]
async fn test_async_wrapper_forces_async_mode() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry().register_pre_hook(
        "connect",
        log.step("wrapped"),
        HookOptions::new().wrapper(Wrapper::Async),
    );

    let controller = conn.controller("connect", vec![]).unwrap();
    assert_eq!(controller.mode(), ChainMode::Async);
    assert_eq!(conn.call("connect", vec![]).unwrap_err().kind, ErrorKind::Configuration);

    assert_eq!(conn.call_async("connect", hook_args![9]).await.unwrap(), json!([9]));
    assert_eq!(log.entries(), vec!["wrapped", "connect"]);
}

#[tokio::test]
async fn test_async_using_reaches_operation() {
    let conn = connection();
    conn.registry().register_pre_hook(
        "fetch",
        Handler::new_async(|inv| async move {
            let mut values = inv.values();
            values.push(json!("/extra"));
            inv.continuation()?
                .proceed(NextOptions::new().using(values))
                .await?;
            Ok::<_, HookError>(Value::Null)
        }),
        HookOptions::new(),
    );

    assert_eq!(conn.call_async("fetch", hook_args!["/a"]).await.unwrap(), json!(2));
}

#[tokio::test]
async fn test_async_bail_skips_operation() {
    let conn = connection();
    conn.registry().register_pre_hook(
        "fetch",
        Handler::new_async(|inv| async move {
            inv.continuation()?
                .proceed(NextOptions::new().bail_with(json!("cached")))
                .await?;
            Ok::<_, HookError>(Value::Null)
        }),
        HookOptions::new(),
    );

    assert_eq!(conn.call_async("fetch", vec![]).await.unwrap(), json!("cached"));
    assert!(conn.target().calls.entries().is_empty());
}

#[tokio::test]
async fn test_async_trait_handler() {
    struct Delay {
        log: Recorder,
    }

    #[async_trait]
    impl AsyncHookHandler for Delay {
        async fn handle(&self, inv: Invocation) -> HookResult<Value> {
            tokio::task::yield_now().await;
            self.log.push("delay");
            inv.continuation()?.proceed(NextOptions::new()).await?;
            Ok(Value::Null)
        }
    }

    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry().register_pre_hook(
        "fetch",
        Handler::from_async_handler(Arc::new(Delay { log: log.clone() })),
        HookOptions::new(),
    );

    conn.call_async("fetch", vec![]).await.unwrap();
    assert_eq!(log.entries(), vec!["delay", "fetch"]);
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let conn = connection();
    conn.registry().register_pre_hook(
        "fetch",
        Handler::new_async(|inv| async move {
            let tag = inv.value(0).cloned().unwrap_or_default();
            tokio::task::yield_now().await;
            inv.continuation()?
                .proceed(NextOptions::new().using(vec![tag.clone(), tag]))
                .await?;
            Ok::<_, HookError>(Value::Null)
        }),
        HookOptions::new(),
    );

    let (a, b, c) = tokio::join!(
        conn.call_async("fetch", hook_args!["a"]),
        conn.call_async("fetch", hook_args!["b"]),
        conn.call_async("fetch", vec![]),
    );
    assert_eq!(a.unwrap(), json!(2));
    assert_eq!(b.unwrap(), json!(2));
    assert_eq!(c.unwrap(), json!(2));
    assert_eq!(conn.target().calls.count("fetch"), 3);
}

#[tokio::test]
async fn test_sync_handler_sees_deferred_next_in_async_mode() {
    let conn = connection();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let record = seen.clone();
    let handler = Handler::new(move |inv| {
        let next = inv.continuation()?;
        record.lock().push(next.defers_next());
        next.advance()?;
        Ok(Value::Null)
    });
    conn.registry()
        .register_pre_hook("fetch", &handler, HookOptions::new())
        .register_pre_hook("connect", &handler, HookOptions::new());

    conn.call_async("fetch", vec![]).await.unwrap();
    conn.call("connect", vec![]).unwrap();
    assert_eq!(*seen.lock(), vec![true, false]);
}
