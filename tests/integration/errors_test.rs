//! Error signalling, recovery, and propagation.

use serde_json::json;

use hookchain_engine::prelude::*;

use crate::helpers::{Recorder, connection};

#[test]
fn test_ignored_error_reaches_next_provider() {
    let conn = connection();
    let log = conn.target().calls.clone();
    let seen = Recorder::new();
    let record = seen.clone();
    let registry = conn.registry();
    registry.register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.fail(HookError::handler("soft failure"))?;
            Ok(Value::Null)
        }),
        HookOptions::new().priority(1).ignore_errors(true),
    );
    registry.register_pre_hook(
        "connect",
        Handler::new(move |inv| {
            if let Some(err) = inv.provider().error() {
                record.push(err.message.clone());
            }
            if let Some(err) = inv.error() {
                record.push(format!("arg:{}", err.message));
            }
            inv.continuation()?.advance()?;
            Ok(Value::Null)
        }),
        HookOptions::new().pass_errors(true),
    );

    assert_eq!(conn.call("connect", hook_args!["db"]).unwrap(), json!(["db"]));
    assert_eq!(seen.entries(), vec!["soft failure", "arg:soft failure"]);
    assert_eq!(log.entries(), vec!["connect"]);
}

#[test]
fn test_unrecovered_error_fails_call() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry().register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.fail(HookError::handler("denied"))?;
            Ok(Value::Null)
        }),
        HookOptions::new().silence_errors(true),
    );

    let err = conn.call("connect", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Handler);
    assert_eq!(err.message, "denied");
    assert!(log.entries().is_empty());
}

#[test]
fn test_recovery_callback_sees_error_and_continues() {
    let conn = connection();
    let seen = Recorder::new();
    let record = seen.clone();
    conn.registry().register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.fail(HookError::handler("retryable"))?;
            Ok(Value::Null)
        }),
        HookOptions::new().run_on_error(move |ep| {
            record.push(format!("{}:{}", ep.hook_type(), ep.error().message));
            ep.error().message == "retryable"
        }),
    );

    assert_eq!(conn.call("connect", hook_args![1]).unwrap(), json!([1]));
    assert_eq!(seen.entries(), vec!["pre:retryable"]);
}

#[test]
fn test_global_options_apply_to_later_registrations() {
    let conn = connection();
    let log = conn.target().calls.clone();
    let registry = conn.registry();
    registry.set_global_options(HookOptions::new().ignore_errors(true));
    registry.register_pre_hook(
        "connect",
        Handler::new(|inv| {
            inv.continuation()?.fail(HookError::handler("ignored globally"))?;
            Ok(Value::Null)
        }),
        HookOptions::new(),
    );

    assert!(conn.call("connect", vec![]).is_ok());
    assert_eq!(log.entries(), vec!["connect"]);
}

#[test]
fn test_operation_error_reaches_caller() {
    let hooked = Hooked::builder(())
        .operation("explode", |_: &(), _| Err(HookError::operation("kaboom")))
        .build();
    let log = Recorder::new();
    hooked
        .registry()
        .register_post_hook("explode", log.step("post"), HookOptions::new());

    let err = hooked.call("explode", vec![]).unwrap_err();
    assert_eq!(err, HookError::operation("kaboom"));
    assert!(log.entries().is_empty());
}

#[test]
fn test_handler_err_bypasses_ignore_errors() {
    let conn = connection();
    conn.registry().register_post_hook(
        "connect",
        Handler::new(|_| Err(HookError::unhandled("post crashed"))),
        HookOptions::new().ignore_errors(true).silence_errors(true),
    );

    let err = conn.call("connect", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unhandled);
    assert_eq!(conn.target().calls.entries(), vec!["connect"]);
}

#[test]
fn test_unknown_operation_registration_is_ignored() {
    let conn = connection();
    let log = conn.target().calls.clone();
    conn.registry()
        .register_pre_hook("disconnect", log.step("never"), HookOptions::new());

    assert!(!conn.registry().has_handlers("disconnect"));
    assert_eq!(
        conn.registry()
            .try_register_hook("disconnect", HookType::Pre, log.step("never"), HookOptions::new())
            .err()
            .map(|e| e.kind),
        Some(ErrorKind::Configuration)
    );
}
