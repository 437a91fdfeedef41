use super::LockHandle;
use crate::error::LockError;
use crate::key::IntoLockKey;
use crate::mode::LockOptions;
use crate::session::Session;

/// Run `body` while holding the advisory lock on `key`.
///
/// Returns `Ok(None)` without running `body` when a try variant
/// (`options.wait == false`) is not granted. The lock is released on every
/// exit from `body`: normal return, error, or panic.
///
/// ```ignore
/// let done = with_lock("nightly-report", LockOptions::default(), &mut client, |lock| {
///     lock.session().batch_execute("REFRESH MATERIALIZED VIEW report")?;
///     Ok::<_, Box<dyn std::error::Error>>(())
/// })?;
/// ```
pub fn with_lock<'s, S, K, T, E, F>(
    key: K,
    options: LockOptions,
    session: &'s mut S,
    body: F,
) -> Result<Option<T>, E>
where
    S: Session,
    K: IntoLockKey,
    E: From<LockError>,
    F: FnOnce(&mut LockHandle<'s, S>) -> Result<T, E>,
{
    LockHandle::new(key, options, session)?.run(body)
}
