use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalized::{fold_text, NormalizedKey};
use crate::error::LockError;

/// An application-chosen lock identifier.
///
/// Deserializes from JSON through the same validation as
/// `TryFrom<serde_json::Value>`: an integer, a two-element integer array, or
/// a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum LockKey {
    Integer(i64),
    Pair(i32, i32),
    Text(String),
}

impl LockKey {
    /// Map the key into the identifier space the primitive accepts.
    pub fn normalize(&self) -> NormalizedKey {
        match self {
            LockKey::Integer(id) => NormalizedKey::Single(*id),
            LockKey::Pair(a, b) => NormalizedKey::Pair(*a, *b),
            LockKey::Text(text) => NormalizedKey::Single(i64::from(fold_text(text))),
        }
    }

    /// Build a pair key from a slice of integers.
    pub fn from_pair_slice(members: &[i64]) -> Result<Self, LockError> {
        match members {
            [a, b] => Ok(LockKey::Pair(pair_member(*a)?, pair_member(*b)?)),
            _ => Err(LockError::invalid_key(format!(
                "pair keys must have exactly two entries, got {}",
                members.len()
            ))),
        }
    }
}

fn pair_member(value: i64) -> Result<i32, LockError> {
    i32::try_from(value).map_err(|_| {
        LockError::invalid_key(format!("pair member {} does not fit in a 32-bit integer", value))
    })
}

fn json_pair_member(value: &Value) -> Result<i32, LockError> {
    match value.as_i64() {
        Some(n) => pair_member(n),
        None => Err(LockError::invalid_key(format!(
            "both members of a pair key must be integers, got {}",
            value
        ))),
    }
}

impl TryFrom<&Value> for LockKey {
    type Error = LockError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(LockKey::Integer)
                .ok_or_else(|| LockError::invalid_key(format!("cannot use {} as a lock id", n))),
            Value::String(text) => Ok(LockKey::Text(text.clone())),
            Value::Array(members) => match members.as_slice() {
                [a, b] => Ok(LockKey::Pair(json_pair_member(a)?, json_pair_member(b)?)),
                _ => Err(LockError::invalid_key(format!(
                    "pair keys must have exactly two entries, got {}",
                    members.len()
                ))),
            },
            other => Err(LockError::invalid_key(format!(
                "cannot use {} as a lock id",
                other
            ))),
        }
    }
}

impl TryFrom<Value> for LockKey {
    type Error = LockError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        LockKey::try_from(&value)
    }
}

impl From<LockKey> for Value {
    fn from(key: LockKey) -> Self {
        match key {
            LockKey::Integer(id) => Value::from(id),
            LockKey::Pair(a, b) => Value::from(vec![a, b]),
            LockKey::Text(text) => Value::String(text),
        }
    }
}

/// Conversion into a validated [`LockKey`].
///
/// Statically typed inputs never fail; dynamic ones (`serde_json::Value`,
/// integer slices) are checked for shape.
pub trait IntoLockKey {
    fn into_lock_key(self) -> Result<LockKey, LockError>;
}

impl IntoLockKey for LockKey {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(self)
    }
}

impl IntoLockKey for &LockKey {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(self.clone())
    }
}

impl IntoLockKey for i64 {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(LockKey::Integer(self))
    }
}

impl IntoLockKey for i32 {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(LockKey::Integer(i64::from(self)))
    }
}

impl IntoLockKey for (i32, i32) {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(LockKey::Pair(self.0, self.1))
    }
}

impl IntoLockKey for [i32; 2] {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(LockKey::Pair(self[0], self[1]))
    }
}

impl IntoLockKey for &str {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(LockKey::Text(self.to_string()))
    }
}

impl IntoLockKey for String {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        Ok(LockKey::Text(self))
    }
}

impl IntoLockKey for &[i64] {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        LockKey::from_pair_slice(self)
    }
}

impl IntoLockKey for Vec<i64> {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        LockKey::from_pair_slice(&self)
    }
}

impl IntoLockKey for &Value {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        LockKey::try_from(self)
    }
}

impl IntoLockKey for Value {
    fn into_lock_key(self) -> Result<LockKey, LockError> {
        LockKey::try_from(&self)
    }
}
