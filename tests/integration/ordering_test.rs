//! Ordering, argument flow, and registry mutation.

use serde_json::json;

use hookchain_core::config::EngineConfig;
use hookchain_engine::prelude::*;

use crate::helpers::{Recorder, connection};

#[test]
fn test_connect_runs_higher_priority_first() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry()
        .register_pre_hook("connect", log.step("A"), HookOptions::new().priority(1))
        .register_pre_hook("connect", log.step("B"), HookOptions::new().priority(5));

    conn.call("connect", hook_args!["db"]).unwrap();
    assert_eq!(log.entries(), vec!["B", "A", "connect"]);
}

#[test]
fn test_every_handler_runs_once_with_stable_ties() {
    let conn = connection();
    let log = conn.target().calls.clone();
    let registry = conn.registry();
    registry.register_pre_hook("connect", log.step("pre-x"), HookOptions::new());
    registry.register_pre_hook("connect", log.step("pre-y"), HookOptions::new().priority(2));
    registry.register_pre_hook("connect", log.step("pre-z"), HookOptions::new());
    registry.register_post_hook("connect", [log.step("post-x"), log.step("post-y")], HookOptions::new());

    conn.call("connect", vec![]).unwrap();
    assert_eq!(
        log.entries(),
        vec!["pre-y", "pre-x", "pre-z", "connect", "post-x", "post-y"]
    );
}

#[test]
fn test_same_handler_twice_and_deregistration() {
    let conn = connection();
    let log = conn.target().calls.clone();
    let twice = log.step("twice");
    let other = log.step("other");
    let registry = conn.registry();
    registry.register_pre_hook("connect", &twice, HookOptions::new());
    registry.register_pre_hook("connect", &twice, HookOptions::new());
    registry.register_pre_hook("connect", &other, HookOptions::new());

    conn.call("connect", vec![]).unwrap();
    assert_eq!(log.count("twice"), 2);

    // A distinct handler built the same way is not a match.
    assert_eq!(registry.deregister_pre_hook("connect", &log.step("twice")), 0);
    assert_eq!(registry.deregister_pre_hook("connect", &twice), 2);

    conn.call("connect", vec![]).unwrap();
    assert_eq!(log.count("twice"), 2);
    assert_eq!(log.count("other"), 2);
}

#[test]
fn test_registration_during_run_applies_to_next_call() {
    let conn = connection();
    let log = conn.target().calls.clone();
    let registry = conn.registry().clone();
    let late = log.step("late");
    let inner_registry = registry.clone();
    registry.register_pre_hook(
        "connect",
        Handler::new(move |inv| {
            if inner_registry.handler_count("connect", HookType::Pre) == 1 {
                inner_registry.register_pre_hook("connect", &late, HookOptions::new().priority(-1));
            }
            inv.continuation()?.advance()?;
            Ok(Value::Null)
        }),
        HookOptions::new(),
    );

    conn.call("connect", vec![]).unwrap();
    assert_eq!(log.entries(), vec!["connect"]);

    conn.call("connect", vec![]).unwrap();
    assert_eq!(log.entries(), vec!["connect", "late", "connect"]);
}

#[test]
fn test_arguments_are_prefixed_in_fixed_order() {
    let conn = connection();
    let shapes = Recorder::new();
    let record = shapes.clone();
    conn.registry().register_pre_hook(
        "connect",
        Handler::new(move |inv| {
            let shape: Vec<&str> = inv
                .args()
                .iter()
                .map(|arg| match arg {
                    HandlerArg::Error(_) => "error",
                    HandlerArg::Next(_) => "next",
                    HandlerArg::Instance(_) => "instance",
                    HandlerArg::Surrogate(_) => "surrogate",
                    HandlerArg::Value(_) => "value",
                })
                .collect();
            record.push(shape.join(","));
            inv.continuation()?.advance()?;
            Ok(Value::Null)
        }),
        HookOptions::new()
            .pass_surrogate(true)
            .pass_instance(true)
            .pass_errors(true),
    );

    conn.call("connect", hook_args![1, 2]).unwrap();
    assert_eq!(shapes.entries(), vec!["error,next,instance,surrogate,value,value"]);
}

#[test]
fn test_using_feeds_next_handler_and_operation() {
    let conn = connection();
    let received = Recorder::new();
    let record = received.clone();
    let registry = conn.registry();
    registry.register_pre_hook(
        "connect",
        Handler::new(|inv| {
            let mut values = inv.values();
            values.push(json!("added"));
            inv.continuation()?.next(NextOptions::new().using(values))?;
            Ok(Value::Null)
        }),
        HookOptions::new().priority(1),
    );
    registry.register_pre_hook(
        "connect",
        Handler::new(move |inv| {
            record.push(Value::Array(inv.provider().received_args().to_vec()).to_string());
            inv.continuation()?.advance()?;
            Ok(Value::Null)
        }),
        HookOptions::new(),
    );

    let result = conn.call("connect", hook_args!["db"]).unwrap();
    assert_eq!(result, json!(["db", "added"]));
    assert_eq!(received.entries(), vec![r#"["db","added"]"#]);
}

#[test]
fn test_default_priority_from_configuration() {
    let config = EngineConfig::from_toml("[chain]\ndefault_priority = 3\n").unwrap();
    let registry = HookRegistry::from_config(&config.chain);
    let log = Recorder::new();
    registry.register_pre_hook("connect", log.step("default"), HookOptions::new());
    registry.register_pre_hook("connect", log.step("explicit"), HookOptions::new().priority(2));

    let handlers = registry.get_event_handlers("connect");
    let priorities: Vec<i32> = handlers.pre.iter().map(|d| d.priority()).collect();
    assert_eq!(priorities, vec![3, 2]);
}

#[test]
fn test_trait_handler_adapts() {
    struct Tagger;

    impl SyncHookHandler for Tagger {
        fn handle(&self, inv: Invocation) -> HookResult<Value> {
            inv.continuation()?
                .next(NextOptions::new().using(hook_args!["tagged"]))?;
            Ok(Value::Null)
        }
    }

    let conn = connection();
    conn.registry().register_pre_hook(
        "connect",
        Handler::from_sync_handler(std::sync::Arc::new(Tagger)),
        HookOptions::new(),
    );
    assert_eq!(conn.call("connect", hook_args!["raw"]).unwrap(), json!(["tagged"]));
}
