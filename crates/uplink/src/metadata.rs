//! Object metadata.

use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uplink_sys::{RawCustomMetadata, RawCustomMetadataEntry, RawSystemMetadata};

use crate::marshal::time;

/// Metadata maintained by the network.
///
/// Listings that do not ask for system metadata leave every field unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetadata {
    /// Creation time.
    pub created: Option<DateTime<Utc>>,
    /// Expiration time, if the object expires.
    pub expires: Option<DateTime<Utc>>,
    /// Size in bytes.
    pub content_length: i64,
}

impl SystemMetadata {
    pub(crate) fn from_raw(raw: &RawSystemMetadata) -> Self {
        Self {
            created: time(raw.created),
            expires: time(raw.expires),
            content_length: raw.content_length,
        }
    }
}

/// User-defined key/value metadata, ordered by key.
///
/// # Examples
///
/// ```
/// use uplink::CustomMetadata;
///
/// let mut metadata = CustomMetadata::new();
/// metadata.insert("content-type", "text/plain");
/// metadata.insert("revision", 3);
/// assert_eq!(metadata.get("revision"), Some("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomMetadata(BTreeMap<String, String>);

impl CustomMetadata {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; non-string values are stored in their `Display` form.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> Option<String> {
        self.0.insert(key.into(), value.to_string())
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Marshal into entry buffers. The count always equals the entry count.
    pub(crate) fn to_raw(&self) -> RawCustomMetadata {
        RawCustomMetadata::from_entries(
            self.0
                .iter()
                .map(|(k, v)| RawCustomMetadataEntry::new(k.as_bytes(), v.as_bytes()))
                .collect(),
        )
    }

    pub(crate) fn from_raw(raw: &RawCustomMetadata) -> Self {
        raw.iter()
            .map(|entry| {
                (
                    String::from_utf8_lossy(entry.key_bytes()).into_owned(),
                    String::from_utf8_lossy(entry.value_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for CustomMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

impl IntoIterator for CustomMetadata {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CustomMetadata {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for CustomMetadata {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
