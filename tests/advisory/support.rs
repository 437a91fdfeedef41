use advisory_locks::{InMemoryAdvisoryStore, InMemorySession, LockHandle, LockOptions};

/// Probe `key` from a fresh session with a non-blocking exclusive acquire,
/// releasing straight away if granted.
pub fn can_lock_exclusive(store: &InMemoryAdvisoryStore, key: &str) -> bool {
    probe(store, key, LockOptions::exclusive().no_wait())
}

pub fn can_lock_shared(store: &InMemoryAdvisoryStore, key: &str) -> bool {
    probe(store, key, LockOptions::shared().no_wait())
}

fn probe(store: &InMemoryAdvisoryStore, key: &str, options: LockOptions) -> bool {
    let mut session: InMemorySession = store.session();
    let mut handle = LockHandle::new(key, options, &mut session).unwrap();
    let granted = handle.acquire().unwrap();
    handle.release().unwrap();
    granted
}
