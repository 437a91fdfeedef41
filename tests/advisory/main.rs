mod support;

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use advisory_locks::{
    with_lock, InMemoryAdvisoryStore, LockError, LockHandle, LockOptions, NormalizedKey,
};

use support::{can_lock_exclusive, can_lock_shared};

// =============================================================================
// Exclusive locks
// =============================================================================

#[test]
fn exclusive_lock_blocks_try_from_other_session() {
    let store = InMemoryAdvisoryStore::new();
    let mut session = store.session();

    let mut handle = LockHandle::new("invoices", LockOptions::default(), &mut session).unwrap();
    assert!(handle.acquire().unwrap());
    assert!(!can_lock_exclusive(&store, "invoices"));
    assert!(!can_lock_shared(&store, "invoices"));

    handle.release().unwrap();
    assert!(can_lock_exclusive(&store, "invoices"));
}

#[test]
fn blocking_acquire_waits_for_release() {
    let store = InMemoryAdvisoryStore::new();
    let mut holder = store.session();
    let mut handle = LockHandle::new("import", LockOptions::default(), &mut holder).unwrap();
    handle.acquire().unwrap();

    let (tx, rx) = mpsc::channel();
    let waiter_store = store.clone();
    let waiter = thread::spawn(move || {
        let mut session = waiter_store.session();
        let mut handle = LockHandle::new("import", LockOptions::default(), &mut session).unwrap();
        let granted = handle.acquire().unwrap();
        tx.send(granted).unwrap();
        handle.release().unwrap();
    });

    assert!(
        rx.recv_timeout(Duration::from_millis(100)).is_err(),
        "waiter acquired a held lock"
    );

    handle.release().unwrap();
    let granted = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("waiter never acquired the lock");
    assert!(granted);
    waiter.join().unwrap();
}

#[test]
fn dropping_the_handle_frees_the_lock() {
    let store = InMemoryAdvisoryStore::new();
    let mut session = store.session();
    let mut handle = LockHandle::new("cleanup", LockOptions::default(), &mut session).unwrap();
    handle.acquire().unwrap();
    assert!(!can_lock_exclusive(&store, "cleanup"));

    drop(handle);
    assert!(can_lock_exclusive(&store, "cleanup"));
    assert!(!session.is_closed());
}

#[test]
fn ending_the_session_frees_the_lock() {
    let store = InMemoryAdvisoryStore::new();
    let mut session = store.session();
    let mut handle = LockHandle::new("cleanup", LockOptions::default(), &mut session).unwrap();
    handle.acquire().unwrap();
    // leak the handle so only closing the session can free the lock
    std::mem::forget(handle);
    assert!(!can_lock_exclusive(&store, "cleanup"));

    session.close();
    assert!(can_lock_exclusive(&store, "cleanup"));
}

// =============================================================================
// Shared locks
// =============================================================================

#[test]
fn shared_locks_coexist_and_exclude_writers() {
    let store = InMemoryAdvisoryStore::new();
    let mut first = store.session();
    let mut second = store.session();

    let mut reader_a =
        LockHandle::new("catalog", LockOptions::shared().no_wait(), &mut first).unwrap();
    let mut reader_b =
        LockHandle::new("catalog", LockOptions::shared().no_wait(), &mut second).unwrap();
    assert!(reader_a.acquire().unwrap());
    assert!(reader_b.acquire().unwrap());
    assert!(!can_lock_exclusive(&store, "catalog"));

    reader_a.release().unwrap();
    assert!(!can_lock_exclusive(&store, "catalog"));
    reader_b.release().unwrap();
    assert!(can_lock_exclusive(&store, "catalog"));
}

// =============================================================================
// Non-blocking acquisition
// =============================================================================

#[test]
fn release_after_denied_try_sends_no_unlock() {
    let store = InMemoryAdvisoryStore::new();
    let mut holder = store.session();
    let mut held = LockHandle::new(77i64, LockOptions::default(), &mut holder).unwrap();
    held.acquire().unwrap();

    let mut session = store.session();
    let mut handle =
        LockHandle::new(77i64, LockOptions::default().no_wait(), &mut session).unwrap();
    assert!(!handle.acquire().unwrap());
    handle.release().unwrap();
    drop(handle);

    let statements: Vec<String> = session.executed().iter().map(|c| c.to_string()).collect();
    assert_eq!(statements, ["SELECT pg_try_advisory_lock(77)"]);
    assert!(store.is_held(NormalizedKey::Single(77)));
}

#[test]
fn colliding_keys_contend() {
    let store = InMemoryAdvisoryStore::new();
    let mut session = store.session();

    // "example" folds to 1861000095
    let mut handle = LockHandle::new("example", LockOptions::default(), &mut session).unwrap();
    handle.acquire().unwrap();

    let mut other = store.session();
    let mut by_id =
        LockHandle::new(1_861_000_095i64, LockOptions::default().no_wait(), &mut other).unwrap();
    assert!(!by_id.acquire().unwrap());
}

#[test]
fn pair_and_single_keys_do_not_contend() {
    let store = InMemoryAdvisoryStore::new();
    let mut a = store.session();
    let mut b = store.session();

    let mut single = LockHandle::new(1i64, LockOptions::default(), &mut a).unwrap();
    let mut pair = LockHandle::new((0i32, 1i32), LockOptions::default().no_wait(), &mut b).unwrap();
    single.acquire().unwrap();
    assert!(pair.acquire().unwrap());
}

// =============================================================================
// Scoped acquisition
// =============================================================================

#[test]
fn scope_releases_after_success() {
    let store = InMemoryAdvisoryStore::new();
    let mut session = store.session();

    let inside = with_lock("rollup", LockOptions::default(), &mut session, |_| {
        Ok::<_, LockError>(can_lock_exclusive(&store, "rollup"))
    })
    .unwrap();

    assert_eq!(inside, Some(false));
    assert!(can_lock_exclusive(&store, "rollup"));
}

#[test]
fn scope_releases_after_error() {
    let store = InMemoryAdvisoryStore::new();
    let mut session = store.session();

    let result: Result<Option<()>, LockError> =
        with_lock("rollup", LockOptions::default(), &mut session, |_| {
            Err(LockError::InvalidKey("raised inside the protected section".into()))
        });

    assert!(result.is_err());
    assert!(can_lock_exclusive(&store, "rollup"));
}

#[test]
fn scope_releases_after_panic() {
    let store = InMemoryAdvisoryStore::new();
    let mut session = store.session();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = with_lock("rollup", LockOptions::default(), &mut session, |_| {
            if can_lock_exclusive(&store, "rollup") {
                return Ok::<_, LockError>(());
            }
            panic!("worker crashed");
        });
    }));

    assert!(outcome.is_err());
    assert!(can_lock_exclusive(&store, "rollup"));
    assert_eq!(session.open_cursors(), 0);
}

#[test]
fn scope_skips_body_when_contended() {
    let store = InMemoryAdvisoryStore::new();
    let mut holder = store.session();
    let mut held = LockHandle::new("rollup", LockOptions::default(), &mut holder).unwrap();
    held.acquire().unwrap();

    let mut session = store.session();
    let result = with_lock("rollup", LockOptions::default().no_wait(), &mut session, |_| {
        Ok::<_, LockError>("ran")
    })
    .unwrap();
    assert_eq!(result, None);
}

#[test]
fn scope_serializes_workers() {
    let store = InMemoryAdvisoryStore::new();
    let (tx, rx) = mpsc::channel();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let store = store.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let mut session = store.session();
                with_lock((1i32, 2i32), LockOptions::default(), &mut session, |_| {
                    tx.send(("enter", worker)).unwrap();
                    thread::sleep(Duration::from_millis(10));
                    tx.send(("leave", worker)).unwrap();
                    Ok::<_, LockError>(())
                })
                .unwrap();
            })
        })
        .collect();
    drop(tx);

    for worker in workers {
        worker.join().unwrap();
    }

    let events: Vec<_> = rx.iter().collect();
    assert_eq!(events.len(), 8);
    for pair in events.chunks(2) {
        assert_eq!(pair[0].0, "enter");
        assert_eq!(pair[1], ("leave", pair[0].1));
    }
}
