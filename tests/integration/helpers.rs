//! Shared helpers for integration tests.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use hookchain_engine::prelude::*;

/// Ordered record of what ran.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    /// Continuation-style handler that records `name` and advances.
    pub fn step(&self, name: &'static str) -> Handler {
        let recorder = self.clone();
        Handler::new(move |inv| {
            recorder.push(name);
            inv.continuation()?.advance()?;
            Ok(Value::Null)
        })
    }

    /// Async handler that records `name` and advances.
    pub fn async_step(&self, name: &'static str) -> Handler {
        let recorder = self.clone();
        Handler::new_async(move |inv| {
            let recorder = recorder.clone();
            async move {
                tokio::task::yield_now().await;
                recorder.push(name);
                inv.continuation()?.proceed(NextOptions::new()).await?;
                Ok::<_, HookError>(Value::Null)
            }
        })
    }
}

/// Test target with a sync `connect` and an async `fetch`.
#[derive(Debug, Default)]
pub struct Connection {
    pub calls: Recorder,
}

/// Wraps a fresh [`Connection`] whose operations log to its recorder.
///
/// `connect` returns its arguments as an array; `fetch` returns the
/// number of arguments it received.
pub fn connection() -> Hooked<Connection> {
    Hooked::builder(Connection::default())
        .operation("connect", |conn: &Connection, args| {
            conn.calls.push("connect");
            Ok(Value::Array(args))
        })
        .async_operation("fetch", |conn: Arc<Connection>, args| async move {
            tokio::task::yield_now().await;
            conn.calls.push("fetch");
            Ok::<_, HookError>(json!(args.len()))
        })
        .build()
}
