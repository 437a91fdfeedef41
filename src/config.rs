use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LockError;
use crate::key::LockKey;
use crate::lock::LockHandle;
use crate::mode::LockOptions;
use crate::session::Session;

/// A named lock as it appears in application configuration.
///
/// ```json
/// { "key": [42, 7], "shared": true, "wait": false }
/// ```
///
/// `shared` and `wait` are optional and default to an exclusive, blocking
/// lock. The key is validated while deserializing.
///
/// [`LockRequest::from_json`] reports a bad key as `LockError::InvalidKey`
/// and any other problem (malformed JSON, missing key, wrong option types)
/// as `LockError::Config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    pub key: LockKey,
    #[serde(flatten)]
    pub options: LockOptions,
}

impl LockRequest {
    pub fn new(key: LockKey, options: LockOptions) -> Self {
        LockRequest { key, options }
    }

    pub fn from_json(json: &str) -> Result<Self, LockError> {
        let value: Value = serde_json::from_str(json)?;
        if let Some(key) = value.get("key") {
            LockKey::try_from(key)?;
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Build a handle for this request on `session`.
    pub fn handle<'s, S: Session>(&self, session: &'s mut S) -> Result<LockHandle<'s, S>, LockError> {
        LockHandle::new(&self.key, self.options, session)
    }
}
