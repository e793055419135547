//! PRE/POST classification of a handler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the wrapped operation a handler runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    /// Runs before the operation; may rewrite its arguments or bail out.
    Pre,
    /// Runs after the operation has produced its result.
    Post,
}

impl HookType {
    /// Returns the string name of this hook type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
