//! Session-scoped PostgreSQL advisory locks.
//!
//! A [`LockHandle`] turns an application key (an integer, a pair of
//! integers, or a string) into the identifier the `pg_advisory_*` functions
//! accept, picks the blocking/try and exclusive/shared variant, and pairs
//! every successful acquire with exactly one release.
//!
//! ```ignore
//! use advisory_locks::{with_lock, LockOptions};
//!
//! let mut client = postgres::Client::connect(url, postgres::NoTls)?;
//! let ran = with_lock("nightly-report", LockOptions::default().no_wait(), &mut client, |lock| {
//!     lock.session().batch_execute("REFRESH MATERIALIZED VIEW report")?;
//!     Ok::<_, Box<dyn std::error::Error>>(())
//! })?;
//! if ran.is_none() {
//!     println!("another worker is already refreshing the report");
//! }
//! ```
//!
//! The session is always supplied by the caller; this crate never opens or
//! closes it. Enable the `postgres` feature for a [`Session`] implementation
//! on `postgres::Client`.

mod command;
mod config;
mod error;
mod key;
mod lock;
mod mode;
mod session;

pub use command::Command;
pub use config::LockRequest;
pub use error::{LockError, SessionError};
pub use key::{fold_text, IntoLockKey, LockKey, NormalizedKey};
pub use lock::{with_lock, LockHandle};
pub use mode::{LockOptions, Primitive};
#[cfg(feature = "postgres")]
pub use session::PgCursor;
pub use session::{InMemoryAdvisoryStore, InMemoryCursor, InMemorySession, Session};
