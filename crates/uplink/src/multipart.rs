//! Multipart uploads.
//!
//! ```text
//! begin_upload ──▶ upload_part(n) ──▶ write* ──▶ set_etag? ──▶ commit
//!      │                 ▲                                       │
//!      │                 └───────────── next part ◀──────────────┘
//!      └──▶ commit_upload | abort_upload
//! ```
//!
//! Part numbers start at 1 and need not be contiguous or ordered. Every
//! part except the last must meet the service's minimum part size; that
//! is only checked by [`Project::commit_upload`].

use std::io;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uplink_sys::{
    Boundary, PartIteration, PartUploadHandle, PartUploadResult, RawCommitUploadOptions,
    RawListUploadPartsOptions, RawPart, RawUploadInfo, UploadIteration,
};

use crate::error::{Error, Result};
use crate::guard::{self, Scoped};
use crate::iterator::ListIter;
use crate::marshal::{cstring, string};
use crate::metadata::{CustomMetadata, SystemMetadata};
use crate::object::{ListObjectsOptions, Object};
use crate::project::Project;
use crate::upload::UploadOptions;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A pending multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    /// Identifier passed to every later call for this upload.
    pub upload_id: String,
    /// Key the object will be committed under.
    pub key: String,
    /// Whether this entry groups uploads under a common prefix.
    pub is_prefix: bool,
    /// Zeroed when a listing did not ask for it.
    pub system: SystemMetadata,
    /// Empty when a listing did not ask for it.
    pub custom: CustomMetadata,
}

impl UploadInfo {
    pub(crate) fn from_raw(raw: &RawUploadInfo) -> Self {
        Self {
            upload_id: string(&raw.upload_id),
            key: string(&raw.key),
            is_prefix: raw.is_prefix,
            system: SystemMetadata::from_raw(&raw.system),
            custom: CustomMetadata::from_raw(&raw.custom),
        }
    }
}

/// A committed part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPart {
    /// 1-based part number.
    pub part_number: u32,
    /// Size in bytes.
    pub size: usize,
    /// When the part was last committed.
    pub modified: DateTime<Utc>,
    /// Entity tag set with [`PartUpload::set_etag`]; empty if none.
    pub etag: String,
}

impl UploadPart {
    pub(crate) fn from_raw(raw: &RawPart) -> Self {
        Self {
            part_number: raw.part_number,
            size: raw.size,
            modified: DateTime::from_timestamp(raw.modified, 0).unwrap_or_default(),
            etag: string(&raw.etag),
        }
    }
}

/// Options for [`Project::commit_upload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitUploadOptions {
    /// Custom metadata of the assembled object.
    pub custom_metadata: CustomMetadata,
}

/// Options for [`Project::list_uploads`]; the same fields as an object
/// listing.
pub type ListUploadsOptions = ListObjectsOptions;

/// Options for [`Project::list_upload_parts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUploadPartsOptions {
    /// Start after this part number.
    pub cursor: u32,
}

/// Pending uploads in key order.
pub type UploadIterator<'p> = ListIter<'p, UploadIteration>;

/// Committed parts in part-number order.
pub type PartIterator<'p> = ListIter<'p, PartIteration>;

// ---------------------------------------------------------------------------
// PartUpload
// ---------------------------------------------------------------------------

/// One part being streamed into a multipart upload.
///
/// Behaves like [`Upload`](crate::Upload): a failed write aborts the part,
/// and dropping it uncommitted discards the data.
#[derive(Debug)]
pub struct PartUpload<'p> {
    handle: PartUploadHandle,
    raw: Scoped<PartUploadResult>,
    part_number: u32,
    finished: bool,
    _project: PhantomData<&'p Project>,
}

impl PartUpload<'_> {
    fn boundary(&self) -> &dyn Boundary {
        self.raw.boundary()
    }

    /// Send bytes; returns how many the library accepted.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let result = self.boundary().part_upload_write(self.handle, bytes);
        match guard::written(self.boundary(), result) {
            Ok(written) => {
                trace!(part = self.part_number, written, "part write");
                Ok(written)
            }
            Err(e) => {
                warn!(part = self.part_number, error = %e, "part write failed, aborting");
                if let Err(abort) = self.abort() {
                    debug!(part = self.part_number, error = %abort, "abort after failed write");
                }
                Err(e)
            }
        }
    }

    /// Send all of `bytes`, looping over partial writes.
    pub fn write_all(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            let written = self.write(bytes)?;
            if written == 0 {
                return Err(Error::internal("uplink: part write accepted no bytes"));
            }
            bytes = &bytes[written.min(bytes.len())..];
        }
        Ok(())
    }

    /// Attach an entity tag, reported back by part listings.
    pub fn set_etag(&mut self, etag: &str) -> Result<()> {
        let etag_c = cstring("etag", etag)?;
        let error = self.boundary().part_upload_set_etag(self.handle, &etag_c);
        guard::status(self.boundary(), error)
    }

    /// Finalize the part. Committing a part number again replaces it.
    pub fn commit(&mut self) -> Result<()> {
        let error = self.boundary().part_upload_commit(self.handle);
        guard::status(self.boundary(), error)?;
        self.finished = true;
        debug!(part = self.part_number, "part committed");
        Ok(())
    }

    /// Discard this part's data.
    pub fn abort(&mut self) -> Result<()> {
        let error = self.boundary().part_upload_abort(self.handle);
        self.finished = true;
        guard::status(self.boundary(), error)
    }

    /// The part as it stands.
    pub fn info(&self) -> Result<UploadPart> {
        let result = self.boundary().part_upload_info(self.handle);
        guard::value(self.boundary(), result, "part_upload_info", UploadPart::from_raw)
    }
}

impl Drop for PartUpload<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(part = self.part_number, "part released without commit");
        }
    }
}

impl io::Write for PartUpload<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        PartUpload::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Project operations
// ---------------------------------------------------------------------------

impl Project {
    /// Start a multipart upload. No object is visible until
    /// [`commit_upload`](Self::commit_upload).
    pub fn begin_upload(
        &self,
        bucket: &str,
        key: &str,
        options: Option<&UploadOptions>,
    ) -> Result<UploadInfo> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let raw_options = options.map(|o| o.to_raw());
        let result = self.boundary().begin_upload(
            self.handle(),
            &bucket_c,
            &key_c,
            raw_options.as_ref(),
        );
        let upload = guard::value(self.boundary(), result, "begin_upload", UploadInfo::from_raw)?;
        info!(bucket, key, upload_id = %upload.upload_id, "multipart upload started");
        Ok(upload)
    }

    /// Assemble the committed parts, in part-number order, into one
    /// object.
    pub fn commit_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        options: Option<&CommitUploadOptions>,
    ) -> Result<Object> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let upload_id_c = cstring("upload_id", upload_id)?;
        let raw_options = options.map(|o| RawCommitUploadOptions {
            custom_metadata: o.custom_metadata.to_raw(),
        });
        let result = self.boundary().commit_upload(
            self.handle(),
            &bucket_c,
            &key_c,
            &upload_id_c,
            raw_options.as_ref(),
        );
        let object = guard::value(self.boundary(), result, "commit_upload", Object::from_raw)?;
        info!(
            bucket,
            key,
            upload_id,
            size = object.system.content_length,
            "multipart upload committed"
        );
        Ok(object)
    }

    /// Discard a pending upload and every part of it.
    pub fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let upload_id_c = cstring("upload_id", upload_id)?;
        let error = self
            .boundary()
            .abort_upload(self.handle(), &bucket_c, &key_c, &upload_id_c);
        guard::status(self.boundary(), error)?;
        info!(bucket, key, upload_id, "multipart upload aborted");
        Ok(())
    }

    /// Start streaming part `part_number` of a pending upload.
    pub fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
    ) -> Result<PartUpload<'_>> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let upload_id_c = cstring("upload_id", upload_id)?;
        let result = self.boundary().upload_part(
            self.handle(),
            &bucket_c,
            &key_c,
            &upload_id_c,
            part_number,
        );
        let (handle, raw) = guard::owned(self.shared(), result, "upload_part")?;
        debug!(bucket, key, upload_id, part = part_number, "part upload started");
        Ok(PartUpload {
            handle,
            raw,
            part_number,
            finished: false,
            _project: PhantomData,
        })
    }

    /// List the pending uploads of a bucket lazily.
    pub fn list_uploads(
        &self,
        bucket: &str,
        options: Option<&ListUploadsOptions>,
    ) -> UploadIterator<'_> {
        let prepared = cstring("bucket", bucket).and_then(|bucket_c| {
            let raw = options.map(ListUploadsOptions::to_raw).transpose()?;
            Ok((bucket_c, raw))
        });
        match prepared {
            Ok((bucket_c, raw)) => {
                let handle =
                    self.boundary()
                        .list_uploads(self.handle(), &bucket_c, raw.as_ref());
                ListIter::new(self, handle)
            }
            Err(e) => ListIter::failed(e),
        }
    }

    /// List the committed parts of a pending upload lazily.
    pub fn list_upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        options: Option<&ListUploadPartsOptions>,
    ) -> PartIterator<'_> {
        let prepared = cstring("bucket", bucket).and_then(|bucket_c| {
            Ok((bucket_c, cstring("key", key)?, cstring("upload_id", upload_id)?))
        });
        match prepared {
            Ok((bucket_c, key_c, upload_id_c)) => {
                let raw_options = options.map(|o| RawListUploadPartsOptions { cursor: o.cursor });
                let handle = self.boundary().list_upload_parts(
                    self.handle(),
                    &bucket_c,
                    &key_c,
                    &upload_id_c,
                    raw_options.as_ref(),
                );
                ListIter::new(self, handle)
            }
            Err(e) => ListIter::failed(e),
        }
    }
}
