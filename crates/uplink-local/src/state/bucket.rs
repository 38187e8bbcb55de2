//! Bucket state.
//!
//! A [`Bucket`] owns its committed objects, sorted by key behind a
//! `parking_lot::RwLock`, and its pending multipart uploads in a `DashMap`
//! keyed by upload id.

use std::collections::BTreeMap;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;
use uplink_sys::RawBucket;

use super::multipart::PendingUpload;
use super::object::StoredObject;
use crate::convert::cstring;

/// A bucket and everything stored in it.
#[derive(Debug)]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Creation time, unix seconds.
    pub created: i64,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    uploads: DashMap<String, PendingUpload>,
}

impl Bucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(name: String, created: i64) -> Self {
        Self {
            name,
            created,
            objects: RwLock::new(BTreeMap::new()),
            uploads: DashMap::new(),
        }
    }

    /// Boundary record.
    #[must_use]
    pub fn to_raw(&self) -> RawBucket {
        RawBucket {
            name: cstring(&self.name),
            created: self.created,
        }
    }

    /// Whether the bucket holds no live object and no pending upload.
    #[must_use]
    pub fn is_empty(&self, now: i64) -> bool {
        self.uploads.is_empty() && self.objects.read().values().all(|o| o.is_expired(now))
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// A live object by key.
    #[must_use]
    pub fn get_object(&self, key: &str, now: i64) -> Option<StoredObject> {
        self.objects
            .read()
            .get(key)
            .filter(|o| !o.is_expired(now))
            .cloned()
    }

    /// Store an object, returning the one it replaced.
    pub fn put_object(&self, object: StoredObject) -> Option<StoredObject> {
        debug!(bucket = %self.name, key = %object.key, size = object.size(), "object stored");
        self.objects.write().insert(object.key.clone(), object)
    }

    /// Remove an object.
    pub fn remove_object(&self, key: &str) -> Option<StoredObject> {
        self.objects.write().remove(key)
    }

    /// Remove every object and pending upload.
    pub fn clear(&self) -> Vec<StoredObject> {
        self.uploads.clear();
        std::mem::take(&mut *self.objects.write())
            .into_values()
            .collect()
    }

    /// Apply `f` to the live objects in key order.
    pub fn with_objects<R>(&self, now: i64, f: impl FnOnce(Vec<(&str, &StoredObject)>) -> R) -> R {
        let objects = self.objects.read();
        let live = objects
            .iter()
            .filter(|(_, o)| !o.is_expired(now))
            .map(|(k, o)| (k.as_str(), o))
            .collect();
        f(live)
    }

    /// Replace the custom metadata of a live object.
    pub fn update_custom(
        &self,
        key: &str,
        now: i64,
        custom: BTreeMap<String, String>,
    ) -> Option<StoredObject> {
        let mut objects = self.objects.write();
        let object = objects.get_mut(key).filter(|o| !o.is_expired(now))?;
        object.custom = custom;
        Some(object.clone())
    }

    // -----------------------------------------------------------------------
    // Multipart uploads
    // -----------------------------------------------------------------------

    /// Register a pending upload.
    pub fn begin_upload(&self, upload: PendingUpload) {
        self.uploads.insert(upload.upload_id.clone(), upload);
    }

    /// Run `f` on a pending upload for `key`, if it exists.
    pub fn with_upload<R>(
        &self,
        upload_id: &str,
        key: &str,
        f: impl FnOnce(&mut PendingUpload) -> R,
    ) -> Option<R> {
        let mut upload = self.uploads.get_mut(upload_id)?;
        if upload.key != key {
            return None;
        }
        Some(f(&mut upload))
    }

    /// Remove a pending upload for `key`.
    pub fn remove_upload(&self, upload_id: &str, key: &str) -> Option<PendingUpload> {
        self.uploads
            .remove_if(upload_id, |_, u| u.key == key)
            .map(|(_, u)| u)
    }

    /// Snapshot of the pending uploads sorted by key then id.
    #[must_use]
    pub fn pending_uploads(&self) -> Vec<PendingUpload> {
        let mut uploads: Vec<PendingUpload> =
            self.uploads.iter().map(|u| u.value().clone()).collect();
        uploads.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.upload_id.cmp(&b.upload_id)));
        uploads
    }
}
