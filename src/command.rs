use std::fmt;

use crate::key::NormalizedKey;

/// A single `SELECT <function>(...)` call against an advisory lock function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    function: &'static str,
    key: NormalizedKey,
}

impl Command {
    pub fn new(function: &'static str, key: NormalizedKey) -> Self {
        Command { function, key }
    }

    pub fn function(&self) -> &'static str {
        self.function
    }

    pub fn key(&self) -> NormalizedKey {
        self.key
    }

    /// Statement text with bound parameters (`$1`, `$2`) in place of the key.
    pub fn sql(&self) -> String {
        match self.key {
            NormalizedKey::Single(_) => format!("SELECT {}($1)", self.function),
            NormalizedKey::Pair(_, _) => format!("SELECT {}($1, $2)", self.function),
        }
    }
}

/// Renders the statement with the key inlined, for logs.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {}({})", self.function, self.key)
    }
}
