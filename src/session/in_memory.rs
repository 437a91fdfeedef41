use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use super::Session;
use crate::command::Command;
use crate::error::SessionError;
use crate::key::NormalizedKey;

/// Per-session hold counts on one key. Advisory locks are reentrant, so a
/// session that locks twice must unlock twice.
#[derive(Debug, Default)]
struct Hold {
    exclusive: u32,
    shared: u32,
}

impl Hold {
    fn is_empty(&self) -> bool {
        self.exclusive == 0 && self.shared == 0
    }
}

#[derive(Debug, Default)]
struct LockTable {
    locks: HashMap<NormalizedKey, HashMap<u64, Hold>>,
}

impl LockTable {
    /// A session never conflicts with itself.
    fn grantable(&self, session: u64, key: &NormalizedKey, shared: bool) -> bool {
        let Some(holders) = self.locks.get(key) else {
            return true;
        };
        holders
            .iter()
            .filter(|(id, _)| **id != session)
            .all(|(_, hold)| if shared { hold.exclusive == 0 } else { hold.is_empty() })
    }

    fn grant(&mut self, session: u64, key: NormalizedKey, shared: bool) {
        let hold = self.locks.entry(key).or_default().entry(session).or_default();
        if shared {
            hold.shared += 1;
        } else {
            hold.exclusive += 1;
        }
    }

    fn revoke(&mut self, session: u64, key: &NormalizedKey, shared: bool) -> bool {
        let Some(holders) = self.locks.get_mut(key) else {
            return false;
        };
        let Some(hold) = holders.get_mut(&session) else {
            return false;
        };
        let count = if shared {
            &mut hold.shared
        } else {
            &mut hold.exclusive
        };
        if *count == 0 {
            return false;
        }
        *count -= 1;
        if hold.is_empty() {
            holders.remove(&session);
        }
        if holders.is_empty() {
            self.locks.remove(key);
        }
        true
    }

    fn revoke_all(&mut self, session: u64) {
        self.locks.retain(|_, holders| {
            holders.remove(&session);
            !holders.is_empty()
        });
    }
}

struct Shared {
    table: Mutex<LockTable>,
    wake: Condvar,
    // kept outside the table so session ids stay unique if it is poisoned
    next_session: AtomicU64,
}

/// In-memory stand-in for a database server's advisory lock table.
///
/// Every [`InMemorySession`] opened from the same store sees the same locks,
/// with the server's semantics: session-scoped, reentrant, shared locks
/// compatible with each other, blocking acquirers parked until a release.
#[derive(Clone)]
pub struct InMemoryAdvisoryStore {
    shared: Arc<Shared>,
}

impl InMemoryAdvisoryStore {
    pub fn new() -> Self {
        InMemoryAdvisoryStore {
            shared: Arc::new(Shared {
                table: Mutex::new(LockTable::default()),
                wake: Condvar::new(),
                next_session: AtomicU64::new(1),
            }),
        }
    }

    /// Open a new session against this store.
    pub fn session(&self) -> InMemorySession {
        let id = self.shared.next_session.fetch_add(1, Ordering::Relaxed);
        InMemorySession {
            id,
            store: self.clone(),
            executed: Vec::new(),
            open_cursors: 0,
            next_cursor: 0,
            fail_next: None,
            closed: false,
        }
    }

    /// Whether any session holds a lock on `key`.
    pub fn is_held(&self, key: NormalizedKey) -> bool {
        self.table()
            .map(|table| table.locks.contains_key(&key))
            .unwrap_or(false)
    }

    fn table(&self) -> Result<MutexGuard<'_, LockTable>, SessionError> {
        self.shared
            .table
            .lock()
            .map_err(|e| SessionError::new(format!("advisory lock table poisoned: {}", e)))
    }

    fn lock(
        &self,
        session: u64,
        key: NormalizedKey,
        shared: bool,
        wait: bool,
    ) -> Result<bool, SessionError> {
        let mut table = self.table()?;
        while !table.grantable(session, &key, shared) {
            if !wait {
                return Ok(false);
            }
            table = self
                .shared
                .wake
                .wait(table)
                .map_err(|e| SessionError::new(format!("advisory lock table poisoned: {}", e)))?;
        }
        table.grant(session, key, shared);
        Ok(true)
    }

    fn unlock(&self, session: u64, key: NormalizedKey, shared: bool) -> Result<bool, SessionError> {
        let mut table = self.table()?;
        let released = table.revoke(session, &key, shared);
        if released {
            self.shared.wake.notify_all();
        }
        Ok(released)
    }

    fn unlock_all(&self, session: u64) {
        if let Ok(mut table) = self.table() {
            table.revoke_all(session);
            self.shared.wake.notify_all();
        }
    }
}

impl Default for InMemoryAdvisoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Statement context handed out by [`InMemorySession`].
#[derive(Debug)]
pub struct InMemoryCursor {
    id: u64,
}

impl InMemoryCursor {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A session on an [`InMemoryAdvisoryStore`].
///
/// Records every command it runs. Closing or dropping the session ends it
/// and frees all of its locks, like a disconnect would.
pub struct InMemorySession {
    id: u64,
    store: InMemoryAdvisoryStore,
    executed: Vec<Command>,
    open_cursors: usize,
    next_cursor: u64,
    fail_next: Option<String>,
    closed: bool,
}

impl InMemorySession {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Commands run so far, oldest first.
    pub fn executed(&self) -> &[Command] {
        &self.executed
    }

    /// Cursors opened and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors
    }

    /// Make the next command fail with `message` without running it.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// End the session, releasing every lock it holds.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.store.unlock_all(self.id);
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            Err(SessionError::new("session is closed"))
        } else {
            Ok(())
        }
    }
}

impl Session for InMemorySession {
    type Cursor = InMemoryCursor;

    fn cursor(&mut self) -> Result<InMemoryCursor, SessionError> {
        self.ensure_open()?;
        self.next_cursor += 1;
        self.open_cursors += 1;
        Ok(InMemoryCursor {
            id: self.next_cursor,
        })
    }

    fn execute(
        &mut self,
        _cursor: &mut InMemoryCursor,
        command: &Command,
    ) -> Result<Option<bool>, SessionError> {
        self.ensure_open()?;
        if let Some(message) = self.fail_next.take() {
            return Err(SessionError::new(message));
        }
        self.executed.push(*command);

        let (id, key) = (self.id, command.key());
        match command.function() {
            "pg_advisory_lock" => self.store.lock(id, key, false, true).map(|_| None),
            "pg_advisory_lock_shared" => self.store.lock(id, key, true, true).map(|_| None),
            "pg_try_advisory_lock" => self.store.lock(id, key, false, false).map(Some),
            "pg_try_advisory_lock_shared" => self.store.lock(id, key, true, false).map(Some),
            "pg_advisory_unlock" => self.store.unlock(id, key, false).map(Some),
            "pg_advisory_unlock_shared" => self.store.unlock(id, key, true).map(Some),
            other => Err(SessionError::new(format!("function {} does not exist", other))),
        }
    }

    fn close_cursor(&mut self, _cursor: InMemoryCursor) -> Result<(), SessionError> {
        self.open_cursors = self.open_cursors.saturating_sub(1);
        Ok(())
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.close();
    }
}
