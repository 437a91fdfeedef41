mod handle;
mod scoped;

pub use handle::LockHandle;
pub use scoped::with_lock;
