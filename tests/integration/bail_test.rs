//! Bail, skip, and run conditions.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use hookchain_engine::prelude::*;

use crate::helpers::{Recorder, connection};

#[test]
fn test_pre_bail_with_short_circuits_connect() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry()
        .register_pre_hook(
            "connect",
            Handler::new(|inv| {
                inv.continuation()?.next(NextOptions::new().bail_with(json!("x")))?;
                Ok(Value::Null)
            }),
            HookOptions::new().priority(1),
        )
        .register_pre_hook("connect", log.step("later-pre"), HookOptions::new())
        .register_post_hook("connect", log.step("post"), HookOptions::new());

    assert_eq!(conn.call("connect", hook_args!["db"]).unwrap(), json!("x"));
    assert!(log.entries().is_empty());
}

#[test]
fn test_post_bail_keeps_result_unless_overridden() {
    let conn = connection();
    conn.registry().register_post_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.bail(None)?;
            Ok(Value::Null)
        }),
        HookOptions::new(),
    );
    assert_eq!(conn.call("connect", hook_args![1]).unwrap(), json!([1]));

    conn.registry().deregister_post_hooks("connect");
    conn.registry().register_post_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.bail(Some(json!("override")))?;
            Ok(Value::Null)
        }),
        HookOptions::new(),
    );
    assert_eq!(conn.call("connect", hook_args![1]).unwrap(), json!("override"));
}

#[test]
fn test_bail_provider_sees_bail_value() {
    let conn = connection();
    let seen = Recorder::new();
    let record = seen.clone();
    conn.registry().register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.bail(Some(json!("stop")))?;
            Ok(Value::Null)
        }),
        HookOptions::new().run_on_bail(move |bp| {
            record.push(format!("{}:{}", bp.action(), bp.bail_with().cloned().unwrap_or_default()));
            false
        }),
    );

    assert_eq!(conn.call("connect", vec![]).unwrap(), json!("stop"));
    assert_eq!(seen.entries(), vec![r#"connect:"stop""#]);
}

#[test]
fn test_skip_passes_exactly_k_handlers() {
    let conn = connection();
    let log = conn.target().calls.clone();
    let registry = conn.registry();
    let skipper = log.clone();
    registry.register_pre_hook(
        "connect",
        Handler::new(move |inv| {
            skipper.push("skipper");
            inv.continuation()?.skip(2)?;
            Ok(Value::Null)
        }),
        HookOptions::new().priority(10),
    );
    registry.register_pre_hook(
        "connect",
        [log.step("one"), log.step("two"), log.step("three")],
        HookOptions::new(),
    );

    conn.call("connect", vec![]).unwrap();
    assert_eq!(log.entries(), vec!["skipper", "three", "connect"]);
}

#[test]
fn test_skip_never_passes_the_operation() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry().register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.skip_with(50, hook_args!["skipped"])?;
            Ok(Value::Null)
        }),
        HookOptions::new(),
    );
    conn.registry().register_post_hook("connect", log.step("post"), HookOptions::new());

    assert_eq!(conn.call("connect", hook_args!["db"]).unwrap(), json!(["skipped"]));
    assert_eq!(log.entries(), vec!["connect", "post"]);
}

#[test]
fn test_false_run_condition_skips_silently() {
    let conn = connection();
    let log = conn.target().calls.clone();
    let evaluated = Arc::new(AtomicUsize::new(0));
    let counter = evaluated.clone();
    conn.registry().register_pre_hook(
        "connect",
        log.step("gated"),
        HookOptions::new().run_condition(move |provider| {
            counter.fetch_add(1, Ordering::SeqCst);
            provider.received_args().first() == Some(&json!("allow"))
        }),
    );

    conn.call("connect", hook_args!["deny"]).unwrap();
    conn.call("connect", hook_args!["allow"]).unwrap();

    assert_eq!(evaluated.load(Ordering::SeqCst), 2);
    assert_eq!(log.entries(), vec!["connect", "gated", "connect"]);
}

#[test]
fn test_run_conditions_pass_values_along() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry().register_pre_hook(
        "connect",
        log.step("chained"),
        HookOptions::new()
            .run_condition(|provider| {
                assert!(!provider.did_receive_from_last_condition());
                provider.pass_to_next_condition(json!(41));
                true
            })
            .run_condition(|provider| {
                provider.value_from_condition().and_then(Value::as_i64) == Some(41)
            }),
    );

    conn.call("connect", vec![]).unwrap();
    assert_eq!(log.entries(), vec!["chained", "connect"]);
}

#[test]
fn test_run_condition_skip_forwards_arguments() {
    let conn = connection();
    let registry = conn.registry();
    registry.register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.next(NextOptions::new().using(hook_args!["rewritten"]))?;
            Ok(Value::Null)
        }),
        HookOptions::new().priority(2),
    );
    registry.register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.next(NextOptions::new().using(hook_args!["never"]))?;
            Ok(Value::Null)
        }),
        HookOptions::new().priority(1).run_condition(|_| false),
    );

    assert_eq!(conn.call("connect", hook_args!["db"]).unwrap(), json!(["rewritten"]));
}
