mod in_memory;
#[cfg(feature = "postgres")]
mod pg;
mod session;

pub use in_memory::{InMemoryAdvisoryStore, InMemoryCursor, InMemorySession};
#[cfg(feature = "postgres")]
pub use pg::PgCursor;
pub use session::Session;
