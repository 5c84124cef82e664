//! Insertion-ordered, string-keyed scalar map tunneled alongside every
//! request and returned in the terminal `Response`/`Error` passed to a
//! callback.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;

/// A JSON-scalar value allowed inside [`CallbackArgs`].
///
/// Restricted to the scalar subset of JSON (no nested objects/arrays) per
/// the data model's "string-keyed map of JSON-scalar values" invariant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonScalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl From<&str> for JsonScalar {
    fn from(value: &str) -> Self {
        JsonScalar::String(value.to_string())
    }
}

impl From<String> for JsonScalar {
    fn from(value: String) -> Self {
        JsonScalar::String(value)
    }
}

impl From<bool> for JsonScalar {
    fn from(value: bool) -> Self {
        JsonScalar::Bool(value)
    }
}

impl From<i64> for JsonScalar {
    fn from(value: i64) -> Self {
        JsonScalar::Number(value.into())
    }
}

impl From<f64> for JsonScalar {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(JsonScalar::Number)
            .unwrap_or(JsonScalar::Null)
    }
}

impl From<JsonScalar> for Json {
    fn from(value: JsonScalar) -> Self {
        match value {
            JsonScalar::Null => Json::Null,
            JsonScalar::Bool(b) => Json::Bool(b),
            JsonScalar::Number(n) => Json::Number(n),
            JsonScalar::String(s) => Json::String(s),
        }
    }
}

/// Error returned when a [`Json`] value is not one of the scalar variants
/// [`JsonScalar`] supports.
#[derive(Debug, Clone, thiserror::Error)]
#[error("callback_args values must be JSON scalars, got a non-scalar value")]
pub struct NotAScalar;

impl TryFrom<Json> for JsonScalar {
    type Error = NotAScalar;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        match value {
            Json::Null => Ok(JsonScalar::Null),
            Json::Bool(b) => Ok(JsonScalar::Bool(b)),
            Json::Number(n) => Ok(JsonScalar::Number(n)),
            Json::String(s) => Ok(JsonScalar::String(s)),
            Json::Array(_) | Json::Object(_) => Err(NotAScalar),
        }
    }
}

/// A deep-frozen, insertion-ordered, string-keyed map of [`JsonScalar`]
/// values.
///
/// Any type implementing `AsRef<str>` can be used as a key (covering both
/// plain strings and enum-newtype "symbol" wrappers); two keys are the same
/// entry iff their string forms are equal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackArgs {
    entries: Vec<(String, JsonScalar)>,
}

impl CallbackArgs {
    /// Creates an empty `CallbackArgs`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `CallbackArgs` from an iterator of key/value pairs,
    /// preserving insertion order and keeping only the last value for a
    /// repeated key.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<JsonScalar>,
    {
        let mut args = Self::new();
        for (k, v) in pairs {
            args.insert(k, v);
        }
        args
    }

    /// Inserts or overwrites a value, preserving the original position on
    /// overwrite.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonScalar>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Looks up a value by key (string or symbol-like reference resolve
    /// identically since both dereference to `&str`).
    pub fn get(&self, key: impl AsRef<str>) -> Option<&JsonScalar> {
        let key = key.as_ref();
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// True if `key` has a value.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonScalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts to a plain `HashMap<String, serde_json::Value>` for
    /// transmission to languages/serializers that expect a map rather than
    /// an ordered list of pairs. Order is lost by this conversion; prefer
    /// `as_hash`/`load` (see [`crate::hash`]) when order must survive a
    /// round-trip.
    pub fn to_json_map(&self) -> HashMap<String, Json> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect()
    }
}

impl fmt::Display for CallbackArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k:?}: {:?}", Json::from(v.clone()))?;
        }
        write!(f, "}}")
    }
}

impl std::ops::Index<&str> for CallbackArgs {
    type Output = JsonScalar;

    fn index(&self, key: &str) -> &Self::Output {
        self.get(key).expect("callback_args key not found")
    }
}
