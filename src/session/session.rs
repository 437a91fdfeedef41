use crate::command::Command;
use crate::error::SessionError;

/// A database session that can run advisory lock commands.
///
/// Advisory locks belong to the session, so the same session must be used
/// for acquire and release. Implementations never need to open or close the
/// session itself; that stays with the caller.
///
/// A cursor is whatever statement context the backend needs to run a
/// command. One is opened per acquisition and closed when the lock is
/// released, whether or not the lock was granted.
pub trait Session {
    type Cursor;

    /// Open a statement context for lock commands.
    fn cursor(&mut self) -> Result<Self::Cursor, SessionError>;

    /// Run `command` and return the first column of the first row when it
    /// is a boolean. `pg_advisory_lock` returns void, so `Ok(None)` there.
    fn execute(
        &mut self,
        cursor: &mut Self::Cursor,
        command: &Command,
    ) -> Result<Option<bool>, SessionError>;

    /// Close a statement context opened by [`Session::cursor`].
    fn close_cursor(&mut self, cursor: Self::Cursor) -> Result<(), SessionError>;
}
