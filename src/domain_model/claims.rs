use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recognized claim names. Other claims pass through untouched.
pub const ID_CLAIM: &str = "jti";
pub const SUBJECT_CLAIM: &str = "sub";
pub const EXPIRATION_CLAIM: &str = "exp";
pub const ISSUED_AT_CLAIM: &str = "iat";

/// A JWT claims mapping. Kept as an open string-to-JSON map so callers can
/// carry arbitrary claims; the recognized ones get typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(pub Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Claims(Map::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The `jti` claim, when present and a string.
    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_CLAIM)
    }

    /// The `sub` claim, when present and a string.
    pub fn subject(&self) -> Option<&str> {
        self.get_str(SUBJECT_CLAIM)
    }

    /// The `exp` claim interpreted as Unix seconds.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.unix_seconds(EXPIRATION_CLAIM)
    }

    /// The `iat` claim interpreted as Unix seconds.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.unix_seconds(ISSUED_AT_CLAIM)
    }

    fn unix_seconds(&self, key: &str) -> Option<DateTime<Utc>> {
        self.0
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

impl FromIterator<(String, Value)> for Claims {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Claims(iter.into_iter().collect())
    }
}
