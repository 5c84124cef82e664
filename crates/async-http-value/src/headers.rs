//! Case-insensitive multimap for HTTP headers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A case-insensitive, order-preserving multimap of HTTP header names to
/// values.
///
/// Lookups are case-insensitive ("Content-Type" and "content-type" resolve
/// to the same entry); iteration yields values in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    // Preserves the original casing of the first-seen name alongside its
    // values; keyed internally by the lower-cased name for lookups.
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl Serialize for HttpHeaders {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HttpHeaders {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<(String, Vec<String>)>::deserialize(deserializer)?;
        let mut headers = HttpHeaders {
            entries,
            index: HashMap::new(),
        };
        headers.rebuild_index();
        Ok(headers)
    }
}

impl HttpHeaders {
    /// Creates an empty header multimap.
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, (name, _)) in self.entries.iter().enumerate() {
            self.index.insert(Self::normalize(name), i);
        }
    }

    /// Inserts a value, appending to any existing values for this name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = Self::normalize(&name);
        if let Some(&idx) = self.index.get(&key) {
            self.entries[idx].1.push(value.into());
        } else {
            self.index.insert(key, self.entries.len());
            self.entries.push((name, vec![value.into()]));
        }
    }

    /// Replaces all values for `name` with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = Self::normalize(&name);
        if let Some(&idx) = self.index.get(&key) {
            self.entries[idx].1 = vec![value.into()];
        } else {
            self.index.insert(key, self.entries.len());
            self.entries.push((name, vec![value.into()]));
        }
    }

    /// Returns the first value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = Self::normalize(name);
        self.index
            .get(&key)
            .and_then(|&idx| self.entries[idx].1.first())
            .map(|s| s.as_str())
    }

    /// Returns all values for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> &[String] {
        let key = Self::normalize(name);
        self.index
            .get(&key)
            .map(|&idx| self.entries[idx].1.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if `name` has at least one value.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&Self::normalize(name))
    }

    /// Iterates over `(name, value)` pairs in insertion order. A header with
    /// multiple values yields one pair per value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no headers are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for HttpHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for HttpHeaders {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = HttpHeaders::new();
        headers.set("Content-Type", "application/json");
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn append_preserves_multiple_values_in_order() {
        let mut headers = HttpHeaders::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("set-cookie", "b=2");
        assert_eq!(headers.get_all("SET-COOKIE"), &["a=1", "b=2"]);
    }

    #[test]
    fn set_replaces_all_existing_values() {
        let mut headers = HttpHeaders::new();
        headers.append("X-Trace", "first");
        headers.append("X-Trace", "second");
        headers.set("x-trace", "only");
        assert_eq!(headers.get_all("X-Trace"), &["only"]);
    }

    #[test]
    fn iteration_order_matches_insertion() {
        let mut headers = HttpHeaders::new();
        headers.append("A", "1");
        headers.append("B", "2");
        headers.append("A", "3");
        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(pairs, vec![("A", "1"), ("A", "3"), ("B", "2")]);
    }

    #[test]
    fn round_trips_through_json() {
        let mut headers = HttpHeaders::new();
        headers.append("Accept", "application/json");
        headers.append("X-Request-Id", "abc123");

        let encoded = serde_json::to_string(&headers).unwrap();
        let decoded: HttpHeaders = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.get("accept"), Some("application/json"));
        assert_eq!(decoded.get("x-request-id"), Some("abc123"));
    }
}
