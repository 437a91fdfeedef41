use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{LockError, SessionError};
use crate::key::{IntoLockKey, LockKey, NormalizedKey};
use crate::mode::{LockOptions, Primitive};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Built, nothing sent yet.
    Idle,
    /// Acquire attempted and the server did not grant the lock.
    NotAcquired,
    Acquired,
    /// Spent. Terminal.
    Released,
}

/// A session-scoped advisory lock on one key.
///
/// The handle borrows the session for its whole life; the lock itself lives
/// in the database session, not in the handle, and survives any enclosing
/// transaction until released or until the session ends.
///
/// A handle is single use: one `acquire`, one `release`. Dropping a handle
/// releases it, so an early return or a panic never leaks the lock.
pub struct LockHandle<'s, S: Session> {
    key: LockKey,
    options: LockOptions,
    acquire_command: Command,
    release_command: Command,
    session: &'s mut S,
    cursor: Option<S::Cursor>,
    state: State,
}

impl<'s, S: Session> LockHandle<'s, S> {
    /// Validate and normalize `key` and pick the lock functions for
    /// `options`. Nothing is sent to the session.
    pub fn new<K: IntoLockKey>(
        key: K,
        options: LockOptions,
        session: &'s mut S,
    ) -> Result<Self, LockError> {
        let key = key.into_lock_key()?;
        let normalized = key.normalize();
        let primitive = options.primitive();

        Ok(LockHandle {
            key,
            options,
            acquire_command: Command::new(primitive.acquire_function(), normalized),
            release_command: Command::new(primitive.release_function(), normalized),
            session,
            cursor: None,
            state: State::Idle,
        })
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn normalized_key(&self) -> NormalizedKey {
        self.acquire_command.key()
    }

    pub fn options(&self) -> LockOptions {
        self.options
    }

    pub fn primitive(&self) -> Primitive {
        self.options.primitive()
    }

    pub fn acquire_command(&self) -> &Command {
        &self.acquire_command
    }

    pub fn release_command(&self) -> &Command {
        &self.release_command
    }

    /// Whether this handle currently holds the lock.
    pub fn is_acquired(&self) -> bool {
        self.state == State::Acquired
    }

    /// The borrowed session, for work done while the lock is held.
    pub fn session(&mut self) -> &mut S {
        self.session
    }

    /// Take the lock.
    ///
    /// Blocking variants wait server-side until the lock is granted and
    /// return `Ok(true)`. Try variants return at once with whether the lock
    /// was granted; `Ok(false)` is contention, not an error.
    ///
    /// # Errors
    ///
    /// `LockError::Session` if the session fails; the handle is then not
    /// acquired. `LockError::HandleReused` on a second call.
    pub fn acquire(&mut self) -> Result<bool, LockError> {
        if self.state != State::Idle {
            return Err(LockError::HandleReused);
        }
        self.state = State::NotAcquired;

        let cursor = self.cursor.insert(self.session.cursor()?);
        debug!(command = %self.acquire_command, "acquiring advisory lock");
        let result = self.session.execute(cursor, &self.acquire_command)?;

        let granted = if self.options.wait {
            true
        } else {
            result.ok_or_else(|| {
                SessionError::new(format!(
                    "{} did not return a boolean",
                    self.acquire_command.function()
                ))
            })?
        };

        if granted {
            self.state = State::Acquired;
            debug!(command = %self.acquire_command, "advisory lock granted");
        } else {
            debug!(command = %self.acquire_command, "advisory lock not granted");
        }
        Ok(granted)
    }

    /// Release the lock if this handle holds it, then close the cursor.
    ///
    /// The unlock command is sent only when `acquire` succeeded. The cursor
    /// is closed either way, even if the unlock fails. A failed unlock
    /// leaves the lock held until the session ends.
    pub fn release(&mut self) -> Result<(), LockError> {
        let unlock = match (self.state, self.cursor.as_mut()) {
            (State::Acquired, Some(cursor)) => {
                debug!(command = %self.release_command, "releasing advisory lock");
                Some(self.session.execute(cursor, &self.release_command))
            }
            _ => None,
        };
        self.state = State::Released;

        let closed = match self.cursor.take() {
            Some(cursor) => self.session.close_cursor(cursor),
            None => Ok(()),
        };

        if let Some(Ok(Some(false))) = unlock {
            warn!(
                command = %self.release_command,
                "advisory lock was not held by this session at release"
            );
        }
        if let Some(Err(err)) = unlock {
            return Err(err.into());
        }
        closed.map_err(LockError::from)
    }

    /// Take the lock, run `body`, and release, returning `Ok(None)` without
    /// running `body` if a try variant was not granted.
    ///
    /// Release runs once on every exit from `body`. If both `body` and the
    /// release fail, the body's error wins and the release error is logged.
    pub fn run<T, E, F>(mut self, body: F) -> Result<Option<T>, E>
    where
        E: From<LockError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let granted = match self.acquire() {
            Ok(granted) => granted,
            Err(err) => {
                if let Err(release_err) = self.release() {
                    warn!(error = %release_err, "cleanup after failed acquire also failed");
                }
                return Err(err.into());
            }
        };
        if !granted {
            self.release()?;
            return Ok(None);
        }

        let outcome = body(&mut self);
        let released = self.release();

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(Some(value)),
            (Ok(_), Err(release_err)) => Err(release_err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!(
                    command = %self.release_command,
                    error = %release_err,
                    "advisory lock release failed after the protected section failed"
                );
                Err(err)
            }
        }
    }
}

impl<S: Session> Drop for LockHandle<'_, S> {
    fn drop(&mut self) {
        if self.state == State::Released {
            return;
        }
        if let Err(err) = self.release() {
            warn!(
                command = %self.release_command,
                error = %err,
                "failed to release advisory lock on drop"
            );
        }
    }
}
