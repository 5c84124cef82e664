//! `serde_with`-style helpers for (de)serializing [`url::Url`] fields,
//! avoiding an extra dependency for what is two small shims.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

pub mod single {
    use super::*;

    pub fn serialize<S: Serializer>(url: &Url, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Url, D::Error> {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

pub mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(urls: &[Url], serializer: S) -> Result<S::Ok, S::Error> {
        let strs: Vec<&str> = urls.iter().map(|u| u.as_str()).collect();
        strs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Url>, D::Error> {
        let strs = Vec::<String>::deserialize(deserializer)?;
        strs.into_iter()
            .map(|s| Url::parse(&s).map_err(serde::de::Error::custom))
            .collect()
    }
}
