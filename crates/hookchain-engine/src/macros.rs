//! Argument-list helpers.

/// Builds a `Vec<Value>` of call arguments from JSON-like expressions.
///
/// ```
/// use hookchain_engine::hook_args;
///
/// let args = hook_args!["db.local", 5432, { "tls": true }];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args[1], serde_json::json!(5432));
/// ```
#[macro_export]
macro_rules! hook_args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:tt),+ $(,)?) => {
        ::std::vec![$($crate::__private::json!($arg)),+]
    };
}
