//! Object handlers: stat, delete, metadata, copy, move, and the upload and
//! download streams.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};
use uplink_sys::{DownloadHandle, ProjectHandle, RawObject, UploadHandle};

use crate::convert::now;
use crate::error::{LocalError, LocalResult};
use crate::grant::{Action, Request, Scope};
use crate::provider::LocalUplink;
use crate::session::Session;
use crate::state::{Bucket, StoredObject};
use crate::stream::{DownloadStream, ReadChunk, UploadStream};
use crate::validation::{validate_bucket_name, validate_object_key};

/// Validate a bucket and key pair and authorize `action` on it.
fn authorize_object(
    session: &Session,
    action: Action,
    operation: &'static str,
    bucket: &str,
    key: &str,
) -> LocalResult<()> {
    validate_bucket_name(bucket)?;
    validate_object_key(key)?;
    session.authorize(&Request::new(action, operation, Scope::Object(bucket, key)))
}

fn live_object(bucket: &Bucket, key: &str) -> LocalResult<StoredObject> {
    bucket
        .get_object(key, now())
        .ok_or_else(|| LocalError::ObjectNotFound { key: key.to_owned() })
}

impl LocalUplink {
    pub(crate) fn handle_stat_object(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
    ) -> LocalResult<RawObject> {
        let session = self.universe.project(project)?;
        authorize_object(&session, Action::Read, "stat_object", bucket, key)?;
        let stored = session.project.get_bucket(bucket)?;
        Ok(live_object(&stored, key)?.to_raw(true, true))
    }

    /// Delete an object. A missing key is not an error.
    pub(crate) fn handle_delete_object(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
    ) -> LocalResult<Option<RawObject>> {
        let session = self.universe.project(project)?;
        authorize_object(&session, Action::Delete, "delete_object", bucket, key)?;
        let stored = session.project.get_bucket(bucket)?;
        let Some(removed) = stored.remove_object(key) else {
            debug!(bucket = %bucket, key = %key, "delete_object: no such key");
            return Ok(None);
        };
        session.project.release_object(removed.size(), removed.segments);
        info!(bucket = %bucket, key = %key, "object deleted");
        if removed.is_expired(now()) {
            return Ok(None);
        }
        Ok(Some(removed.to_raw(true, true)))
    }

    pub(crate) fn handle_update_object_metadata(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        custom: BTreeMap<String, String>,
    ) -> LocalResult<()> {
        let session = self.universe.project(project)?;
        authorize_object(&session, Action::Write, "update_object_metadata", bucket, key)?;
        let stored = session.project.get_bucket(bucket)?;
        stored
            .update_custom(key, now(), custom)
            .ok_or_else(|| LocalError::ObjectNotFound { key: key.to_owned() })?;
        debug!(bucket = %bucket, key = %key, "object metadata updated");
        Ok(())
    }

    pub(crate) fn handle_copy_object(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        new_bucket: &str,
        new_key: &str,
    ) -> LocalResult<RawObject> {
        let session = self.universe.project(project)?;
        authorize_object(&session, Action::Read, "copy_object", bucket, key)?;
        authorize_object(&session, Action::Write, "copy_object", new_bucket, new_key)?;

        let source = live_object(&*session.project.get_bucket(bucket)?, key)?;
        let target = session.project.get_bucket(new_bucket)?;
        session
            .project
            .reserve_storage(source.size(), self.config.storage_limit)?;
        if let Err(e) = session
            .project
            .reserve_segments(source.segments, self.config.segment_limit)
        {
            session.project.release_storage(source.size());
            return Err(e);
        }

        let copy = StoredObject {
            key: new_key.to_owned(),
            created: now(),
            ..source
        };
        if let Some(old) = target.put_object(copy.clone()) {
            session.project.release_object(old.size(), old.segments);
        }
        info!(
            from = %format!("{bucket}/{key}"),
            to = %format!("{new_bucket}/{new_key}"),
            "object copied"
        );
        Ok(copy.to_raw(true, true))
    }

    pub(crate) fn handle_move_object(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        new_bucket: &str,
        new_key: &str,
    ) -> LocalResult<()> {
        let session = self.universe.project(project)?;
        authorize_object(&session, Action::Read, "move_object", bucket, key)?;
        authorize_object(&session, Action::Delete, "move_object", bucket, key)?;
        authorize_object(&session, Action::Write, "move_object", new_bucket, new_key)?;

        let source_bucket = session.project.get_bucket(bucket)?;
        let target = session.project.get_bucket(new_bucket)?;
        let source = live_object(&source_bucket, key)?;
        if bucket == new_bucket && key == new_key {
            return Ok(());
        }
        source_bucket.remove_object(key);
        let moved = StoredObject {
            key: new_key.to_owned(),
            ..source
        };
        if let Some(old) = target.put_object(moved) {
            session.project.release_object(old.size(), old.segments);
        }
        info!(
            from = %format!("{bucket}/{key}"),
            to = %format!("{new_bucket}/{new_key}"),
            "object moved"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    pub(crate) fn handle_upload_object(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        expires: i64,
    ) -> LocalResult<UploadHandle> {
        let session = self.universe.project(project)?;
        authorize_object(&session, Action::Write, "upload_object", bucket, key)?;
        session.project.get_bucket(bucket)?;
        let stream = UploadStream::new(
            Arc::clone(&session),
            bucket.to_owned(),
            key.to_owned(),
            expires,
        );
        debug!(bucket = %bucket, key = %key, expires, "upload started");
        Ok(self.universe.insert_upload(Arc::new(Mutex::new(stream))))
    }

    pub(crate) fn handle_upload_write(
        &self,
        upload: UploadHandle,
        bytes: &[u8],
    ) -> LocalResult<usize> {
        self.universe.upload(upload)?.lock().write(bytes)
    }

    pub(crate) fn handle_upload_set_custom_metadata(
        &self,
        upload: UploadHandle,
        custom: BTreeMap<String, String>,
    ) -> LocalResult<()> {
        self.universe.upload(upload)?.lock().set_custom(custom)
    }

    pub(crate) fn handle_upload_commit(&self, upload: UploadHandle) -> LocalResult<()> {
        self.universe.upload(upload)?.lock().commit()
    }

    pub(crate) fn handle_upload_abort(&self, upload: UploadHandle) -> LocalResult<()> {
        self.universe.upload(upload)?.lock().abort()
    }

    pub(crate) fn handle_upload_info(&self, upload: UploadHandle) -> LocalResult<RawObject> {
        Ok(self.universe.upload(upload)?.lock().info())
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    pub(crate) fn handle_download_object(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        offset: i64,
        length: i64,
    ) -> LocalResult<DownloadHandle> {
        let session = self.universe.project(project)?;
        authorize_object(&session, Action::Read, "download_object", bucket, key)?;
        let object = live_object(&*session.project.get_bucket(bucket)?, key)?;
        let stream = DownloadStream::new(Arc::clone(&session), &object, offset, length)?;
        debug!(bucket = %bucket, key = %key, offset, length, "download started");
        Ok(self.universe.insert_download(Arc::new(Mutex::new(stream))))
    }

    pub(crate) fn handle_download_read(
        &self,
        download: DownloadHandle,
        buffer: &mut [u8],
    ) -> LocalResult<ReadChunk> {
        self.universe.download(download)?.lock().read(buffer)
    }

    pub(crate) fn handle_download_info(&self, download: DownloadHandle) -> LocalResult<RawObject> {
        Ok(self.universe.download(download)?.lock().info())
    }

    pub(crate) fn handle_close_download(&self, download: DownloadHandle) -> LocalResult<()> {
        self.universe.download(download)?.lock().close()
    }
}
