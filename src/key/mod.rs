mod lock_key;
mod normalized;

pub use lock_key::{IntoLockKey, LockKey};
pub use normalized::{fold_text, NormalizedKey};
