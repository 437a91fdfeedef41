use serde::{Deserialize, Serialize};

/// How a lock is taken: shared or exclusive, blocking or try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    /// Take a shared lock instead of an exclusive one.
    pub shared: bool,
    /// Block until the lock is granted. When false, acquisition returns
    /// immediately with whether the lock was granted.
    pub wait: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            shared: false,
            wait: true,
        }
    }
}

impl LockOptions {
    /// Blocking exclusive lock.
    pub fn exclusive() -> Self {
        Self::default()
    }

    /// Blocking shared lock.
    pub fn shared() -> Self {
        Self {
            shared: true,
            wait: true,
        }
    }

    /// Same options, but without waiting.
    pub fn no_wait(mut self) -> Self {
        self.wait = false;
        self
    }

    pub fn primitive(&self) -> Primitive {
        Primitive::select(self.wait, self.shared)
    }
}

/// The four advisory lock function pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Exclusive,
    Shared,
    TryExclusive,
    TryShared,
}

impl Primitive {
    pub fn select(wait: bool, shared: bool) -> Self {
        match (wait, shared) {
            (true, false) => Primitive::Exclusive,
            (true, true) => Primitive::Shared,
            (false, false) => Primitive::TryExclusive,
            (false, true) => Primitive::TryShared,
        }
    }

    pub fn acquire_function(&self) -> &'static str {
        match self {
            Primitive::Exclusive => "pg_advisory_lock",
            Primitive::Shared => "pg_advisory_lock_shared",
            Primitive::TryExclusive => "pg_try_advisory_lock",
            Primitive::TryShared => "pg_try_advisory_lock_shared",
        }
    }

    pub fn release_function(&self) -> &'static str {
        if self.is_shared() {
            "pg_advisory_unlock_shared"
        } else {
            "pg_advisory_unlock"
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Primitive::Shared | Primitive::TryShared)
    }

    pub fn waits(&self) -> bool {
        matches!(self, Primitive::Exclusive | Primitive::Shared)
    }
}
