//! Bucket operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uplink_sys::{BucketIteration, BucketResult, RawBucket, RawListBucketsOptions};

use crate::error::Result;
use crate::guard;
use crate::iterator::ListIter;
use crate::marshal::{cstring, opt_cstring, string};
use crate::project::Project;

/// A bucket as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Bucket {
    pub(crate) fn from_raw(raw: &RawBucket) -> Self {
        Self {
            name: string(&raw.name),
            created: DateTime::from_timestamp(raw.created, 0).unwrap_or_default(),
        }
    }
}

/// Options for [`Project::list_buckets`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBucketsOptions {
    /// Start after this bucket name.
    pub cursor: Option<String>,
}

impl ListBucketsOptions {
    fn to_raw(&self) -> Result<RawListBucketsOptions> {
        Ok(RawListBucketsOptions {
            cursor: opt_cstring("cursor", self.cursor.as_deref())?,
        })
    }
}

/// Buckets in name order.
pub type BucketIterator<'p> = ListIter<'p, BucketIteration>;

impl Project {
    fn bucket_call(
        &self,
        bucket: &str,
        call: &'static str,
        f: impl FnOnce(&Self, &std::ffi::CStr) -> BucketResult,
    ) -> Result<Bucket> {
        let bucket_c = cstring("bucket", bucket)?;
        let result = f(self, &bucket_c);
        guard::value(self.boundary(), result, call, Bucket::from_raw)
    }

    /// Look up a bucket.
    pub fn stat_bucket(&self, bucket: &str) -> Result<Bucket> {
        self.bucket_call(bucket, "stat_bucket", |p, b| {
            p.boundary().stat_bucket(p.handle(), b)
        })
    }

    /// Create a bucket; fails if it already exists.
    pub fn create_bucket(&self, bucket: &str) -> Result<Bucket> {
        let created = self.bucket_call(bucket, "create_bucket", |p, b| {
            p.boundary().create_bucket(p.handle(), b)
        })?;
        info!(bucket, "bucket created");
        Ok(created)
    }

    /// Create a bucket unless it already exists.
    pub fn ensure_bucket(&self, bucket: &str) -> Result<Bucket> {
        let ensured = self.bucket_call(bucket, "ensure_bucket", |p, b| {
            p.boundary().ensure_bucket(p.handle(), b)
        })?;
        debug!(bucket, "bucket ensured");
        Ok(ensured)
    }

    /// Delete an empty bucket.
    pub fn delete_bucket(&self, bucket: &str) -> Result<Bucket> {
        let deleted = self.bucket_call(bucket, "delete_bucket", |p, b| {
            p.boundary().delete_bucket(p.handle(), b)
        })?;
        info!(bucket, "bucket deleted");
        Ok(deleted)
    }

    /// Delete a bucket together with its objects and pending uploads.
    pub fn delete_bucket_with_objects(&self, bucket: &str) -> Result<Bucket> {
        let deleted = self.bucket_call(bucket, "delete_bucket_with_objects", |p, b| {
            p.boundary().delete_bucket_with_objects(p.handle(), b)
        })?;
        info!(bucket, "bucket deleted with objects");
        Ok(deleted)
    }

    /// List buckets lazily.
    ///
    /// Marshalling failures surface from the first call to
    /// [`ListIter::advance`] rather than here.
    pub fn list_buckets(&self, options: Option<&ListBucketsOptions>) -> BucketIterator<'_> {
        match options.map(ListBucketsOptions::to_raw).transpose() {
            Ok(raw) => {
                let handle = self.boundary().list_buckets(self.handle(), raw.as_ref());
                ListIter::new(self, handle)
            }
            Err(e) => ListIter::failed(e),
        }
    }
}
