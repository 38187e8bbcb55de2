//! Per-project state on the simulated satellite.
//!
//! A [`ProjectState`] is shared by every session opened with grants that
//! descend from the same API key. It owns the buckets, the usage counters
//! that back the project limits, and the set of revoked chain tails.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tracing::info;

use super::bucket::Bucket;
use crate::error::{LocalError, LocalResult};

/// State of one project.
#[derive(Debug)]
pub struct ProjectState {
    /// The API key head identifying the project.
    pub api_key: String,
    buckets: DashMap<String, Arc<Bucket>>,
    revoked: DashMap<String, Instant>,
    storage_used: AtomicU64,
    bandwidth_used: AtomicU64,
    segments_used: AtomicU64,
}

impl ProjectState {
    /// Create an empty project.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            buckets: DashMap::new(),
            revoked: DashMap::new(),
            storage_used: AtomicU64::new(0),
            bandwidth_used: AtomicU64::new(0),
            segments_used: AtomicU64::new(0),
        }
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    /// Create a bucket.
    pub fn create_bucket(&self, name: &str, created: i64) -> LocalResult<Arc<Bucket>> {
        match self.buckets.entry(name.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(LocalError::BucketAlreadyExists {
                bucket: name.to_owned(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let bucket = Arc::new(Bucket::new(name.to_owned(), created));
                slot.insert(Arc::clone(&bucket));
                info!(bucket = %name, "bucket created");
                Ok(bucket)
            }
        }
    }

    /// Create a bucket unless it exists; return it either way.
    pub fn ensure_bucket(&self, name: &str, created: i64) -> Arc<Bucket> {
        let bucket = self
            .buckets
            .entry(name.to_owned())
            .or_insert_with(|| {
                info!(bucket = %name, "bucket created");
                Arc::new(Bucket::new(name.to_owned(), created))
            });
        Arc::clone(bucket.value())
    }

    /// Look up a bucket.
    pub fn get_bucket(&self, name: &str) -> LocalResult<Arc<Bucket>> {
        self.buckets
            .get(name)
            .map(|b| Arc::clone(b.value()))
            .ok_or_else(|| LocalError::BucketNotFound {
                bucket: name.to_owned(),
            })
    }

    /// Delete a bucket. Unless `with_objects`, it must be empty.
    pub fn delete_bucket(
        &self,
        name: &str,
        with_objects: bool,
        now: i64,
    ) -> LocalResult<Arc<Bucket>> {
        let bucket = self.get_bucket(name)?;
        if with_objects {
            for upload in bucket.pending_uploads() {
                self.release_storage(upload.total_size());
            }
            for object in bucket.clear() {
                self.release_object(object.size(), object.segments);
            }
        } else if !bucket.is_empty(now) {
            return Err(LocalError::BucketNotEmpty {
                bucket: name.to_owned(),
            });
        }
        self.buckets.remove(name);
        info!(bucket = %name, with_objects, "bucket deleted");
        Ok(bucket)
    }

    /// All buckets sorted by name.
    #[must_use]
    pub fn list_buckets(&self) -> Vec<Arc<Bucket>> {
        let mut buckets: Vec<Arc<Bucket>> =
            self.buckets.iter().map(|b| Arc::clone(b.value())).collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
    }

    // -----------------------------------------------------------------------
    // Revocation
    // -----------------------------------------------------------------------

    /// Revoke every grant whose chain passes through `tail`, from `effective_at`.
    pub fn revoke(&self, tail: String, effective_at: Instant) {
        self.revoked.insert(tail, effective_at);
    }

    /// Whether any of `tails` is revoked at `now`.
    #[must_use]
    pub fn is_revoked(&self, tails: &[String], now: Instant) -> bool {
        tails
            .iter()
            .any(|t| self.revoked.get(t).is_some_and(|at| now >= *at))
    }

    // -----------------------------------------------------------------------
    // Usage accounting
    // -----------------------------------------------------------------------

    /// Reserve `bytes` of storage; `limit == 0` is unlimited.
    pub fn reserve_storage(&self, bytes: u64, limit: u64) -> LocalResult<()> {
        reserve(&self.storage_used, bytes, limit).map_err(|()| LocalError::StorageLimitExceeded)
    }

    /// Return previously reserved storage.
    pub fn release_storage(&self, bytes: u64) {
        release(&self.storage_used, bytes);
    }

    /// Reserve `count` segments; `limit == 0` is unlimited.
    pub fn reserve_segments(&self, count: u64, limit: u64) -> LocalResult<()> {
        reserve(&self.segments_used, count, limit).map_err(|()| LocalError::SegmentsLimitExceeded)
    }

    /// Account for egress; `limit == 0` is unlimited.
    pub fn charge_bandwidth(&self, bytes: u64, limit: u64) -> LocalResult<()> {
        reserve(&self.bandwidth_used, bytes, limit).map_err(|()| LocalError::BandwidthLimitExceeded)
    }

    /// Return the storage and segments held by a removed object.
    pub fn release_object(&self, size: u64, segments: u64) {
        release(&self.storage_used, size);
        release(&self.segments_used, segments);
    }

    /// Bytes of storage in use, including uncommitted uploads.
    #[must_use]
    pub fn storage_used(&self) -> u64 {
        self.storage_used.load(Ordering::Acquire)
    }
}

fn reserve(counter: &AtomicU64, amount: u64, limit: u64) -> Result<(), ()> {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
            let next = used.saturating_add(amount);
            (limit == 0 || next <= limit).then_some(next)
        })
        .map(|_| ())
        .map_err(|_| ())
}

fn release(counter: &AtomicU64, amount: u64) {
    let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
        Some(used.saturating_sub(amount))
    });
}
