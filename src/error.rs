use std::error::Error as StdError;

use thiserror::Error;

/// Error type for advisory lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// The key is not an integer, a two-integer pair, or a string.
    #[error("invalid lock key: {0}")]
    InvalidKey(String),
    /// A lock entry in configuration could not be parsed.
    #[error("invalid lock configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// The session failed while executing a lock command.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// `acquire` was called on a handle that already attempted acquisition.
    #[error("lock handle already used; create a new handle to acquire again")]
    HandleReused,
}

impl LockError {
    pub(crate) fn invalid_key(msg: impl Into<String>) -> Self {
        LockError::InvalidKey(msg.into())
    }
}

/// A failure surfaced by the session collaborator.
///
/// Carries the backend's own error as `source()` when there is one, so
/// callers can downcast to e.g. `postgres::Error`.
#[derive(Debug, Error)]
#[error("session error: {message}")]
pub struct SessionError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl SessionError {
    pub fn new(message: impl Into<String>) -> Self {
        SessionError {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        SessionError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
