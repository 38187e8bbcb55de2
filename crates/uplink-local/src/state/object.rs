//! Stored objects.

use std::collections::BTreeMap;

use bytes::Bytes;
use uplink_sys::{RawObject, RawSystemMetadata};

use crate::convert::{cstring, custom_to_raw};

/// A committed object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object key.
    pub key: String,
    /// Commit time, unix seconds.
    pub created: i64,
    /// Expiration time, unix seconds; `0` never expires.
    pub expires: i64,
    /// Content.
    pub data: Bytes,
    /// Custom metadata.
    pub custom: BTreeMap<String, String>,
    /// Segments the object occupies.
    pub segments: u64,
}

impl StoredObject {
    /// Content length in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the object has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires != 0 && self.expires <= now
    }

    /// System metadata.
    #[must_use]
    pub fn system(&self) -> RawSystemMetadata {
        RawSystemMetadata {
            created: self.created,
            expires: self.expires,
            content_length: i64::try_from(self.data.len()).unwrap_or(i64::MAX),
        }
    }

    /// Boundary record; metadata is zeroed unless requested.
    #[must_use]
    pub fn to_raw(&self, system: bool, custom: bool) -> RawObject {
        RawObject {
            key: cstring(&self.key),
            is_prefix: false,
            system: if system {
                self.system()
            } else {
                RawSystemMetadata::default()
            },
            custom: if custom {
                custom_to_raw(&self.custom)
            } else {
                uplink_sys::RawCustomMetadata::default()
            },
        }
    }
}

/// A synthetic prefix entry for directory-style listings.
#[must_use]
pub fn prefix_object(prefix: &str) -> RawObject {
    RawObject {
        key: cstring(prefix),
        is_prefix: true,
        system: RawSystemMetadata::default(),
        custom: uplink_sys::RawCustomMetadata::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> StoredObject {
        let mut custom = BTreeMap::new();
        custom.insert("foo".to_owned(), "bar".to_owned());
        StoredObject {
            key: "a/b.txt".to_owned(),
            created: 10,
            expires: 20,
            data: Bytes::from_static(b"hello world"),
            custom,
            segments: 1,
        }
    }

    #[test]
    fn test_should_zero_metadata_unless_requested() {
        let raw = object().to_raw(false, false);
        assert_eq!(raw.system, RawSystemMetadata::default());
        assert_eq!(raw.custom.count, 0);

        let raw = object().to_raw(true, true);
        assert_eq!(raw.system.content_length, 11);
        assert_eq!(raw.custom.count, 1);
    }

    #[test]
    fn test_should_report_expiry() {
        let obj = object();
        assert!(!obj.is_expired(19));
        assert!(obj.is_expired(20));

        let forever = StoredObject { expires: 0, ..object() };
        assert!(!forever.is_expired(i64::MAX));
    }

    #[test]
    fn test_should_build_prefix_entry() {
        let raw = prefix_object("x/");
        assert!(raw.is_prefix);
        assert_eq!(raw.key.to_str().ok(), Some("x/"));
    }
}
