//! Streaming object uploads.
//!
//! An [`Upload`] moves through `open -> write* -> commit | abort`. The
//! library rejects any call after the terminal one with
//! [`ErrorKind::UploadDone`](crate::ErrorKind::UploadDone); this module
//! does not track that state itself.
//!
//! A write that fails aborts the upload before the error is returned, so
//! a half-written object can never be committed.

use std::io;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uplink_sys::{Boundary, RawUploadOptions, UploadHandle, UploadResult};

use crate::error::{Error, Result};
use crate::guard::{self, Scoped};
use crate::marshal::{cstring, seconds};
use crate::metadata::CustomMetadata;
use crate::object::Object;
use crate::project::Project;

/// Options for [`Project::upload_object`] and [`Project::begin_upload`].
///
/// [`Project::begin_upload`]: crate::Project::begin_upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptions {
    /// When the object stops being visible; `None` keeps it forever.
    pub expires: Option<DateTime<Utc>>,
}

impl UploadOptions {
    pub(crate) fn to_raw(self) -> RawUploadOptions {
        RawUploadOptions {
            expires: seconds(self.expires),
        }
    }
}

/// An in-progress object upload.
#[derive(Debug)]
pub struct Upload<'p> {
    handle: UploadHandle,
    raw: Scoped<UploadResult>,
    finished: bool,
    _project: PhantomData<&'p Project>,
}

impl Upload<'_> {
    fn boundary(&self) -> &dyn Boundary {
        self.raw.boundary()
    }

    /// Send bytes; returns how many the library accepted, which may be
    /// fewer than `bytes.len()`.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let result = self.boundary().upload_write(self.handle, bytes);
        match guard::written(self.boundary(), result) {
            Ok(written) => {
                trace!(upload = %self.handle, requested = bytes.len(), written, "upload write");
                Ok(written)
            }
            Err(e) => {
                warn!(upload = %self.handle, error = %e, "upload write failed, aborting");
                if let Err(abort) = self.abort() {
                    debug!(upload = %self.handle, error = %abort, "abort after failed write");
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
                return Err(Error::internal("uplink: upload write accepted no bytes"));
            }
            bytes = &bytes[written.min(bytes.len())..];
        }
        Ok(())
    }

    /// Replace the custom metadata the object will be committed with.
    pub fn set_custom_metadata(&mut self, metadata: &CustomMetadata) -> Result<()> {
        let error = self
            .boundary()
            .upload_set_custom_metadata(self.handle, &metadata.to_raw());
        guard::status(self.boundary(), error)
    }

    /// Finalize the object.
    pub fn commit(&mut self) -> Result<()> {
        let error = self.boundary().upload_commit(self.handle);
        guard::status(self.boundary(), error)?;
        self.finished = true;
        info!(upload = %self.handle, "upload committed");
        Ok(())
    }

    /// Discard everything written. An existing object under the key is
    /// left untouched.
    pub fn abort(&mut self) -> Result<()> {
        let error = self.boundary().upload_abort(self.handle);
        self.finished = true;
        guard::status(self.boundary(), error)?;
        debug!(upload = %self.handle, "upload aborted");
        Ok(())
    }

    /// The object as it stands, final after a commit.
    pub fn info(&self) -> Result<Object> {
        let result = self.boundary().upload_info(self.handle);
        guard::value(self.boundary(), result, "upload_info", Object::from_raw)
    }
}

impl Drop for Upload<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(upload = %self.handle, "upload released without commit");
        }
    }
}

impl io::Write for Upload<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Upload::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Project {
    /// Start uploading an object. Nothing is visible until
    /// [`Upload::commit`].
    pub fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        options: Option<&UploadOptions>,
    ) -> Result<Upload<'_>> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let raw_options = options.map(|o| o.to_raw());
        let result = self.boundary().upload_object(
            self.handle(),
            &bucket_c,
            &key_c,
            raw_options.as_ref(),
        );
        let (handle, raw) = guard::owned(self.shared(), result, "upload_object")?;
        debug!(upload = %handle, bucket, key, "upload started");
        Ok(Upload {
            handle,
            raw,
            finished: false,
            _project: PhantomData,
        })
    }
}
