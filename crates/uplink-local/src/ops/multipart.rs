//! Multipart upload handlers.
//!
//! A pending upload is a set of numbered parts. `commit_upload` joins them
//! in part-number order into one object and removes the pending state;
//! `abort_upload` discards it and gives back the storage it held.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};
use uplink_sys::{PartUploadHandle, ProjectHandle, RawObject, RawPart, RawUploadInfo};

use crate::convert::now;
use crate::error::{LocalError, LocalResult};
use crate::grant::{Action, Request, Scope};
use crate::provider::LocalUplink;
use crate::state::{PendingUpload, StoredObject};
use crate::stream::PartStream;
use crate::validation::{validate_bucket_name, validate_object_key};

impl LocalUplink {
    pub(crate) fn handle_begin_upload(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        expires: i64,
    ) -> LocalResult<RawUploadInfo> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        validate_object_key(key)?;
        session.authorize(&Request::new(
            Action::Write,
            "begin_upload",
            Scope::Object(bucket, key),
        ))?;
        let stored = session.project.get_bucket(bucket)?;

        let upload = PendingUpload::new(key.to_owned(), now(), expires);
        let info = upload.to_raw(true);
        info!(
            bucket = %bucket,
            key = %key,
            upload_id = %upload.upload_id,
            "multipart upload started"
        );
        stored.begin_upload(upload);
        Ok(info)
    }

    pub(crate) fn handle_commit_upload(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        upload_id: &str,
        custom: BTreeMap<String, String>,
    ) -> LocalResult<RawObject> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        validate_object_key(key)?;
        session.authorize(&Request::new(
            Action::Write,
            "commit_upload",
            Scope::Object(bucket, key),
        ))?;
        let stored = session.project.get_bucket(bucket)?;
        let not_found = || LocalError::UploadNotFound {
            upload_id: upload_id.to_owned(),
        };

        let (data, segments, expires) = stored
            .with_upload(upload_id, key, |upload| {
                upload
                    .assemble(self.config.min_part_size)
                    .map(|data| (data, upload.parts.len() as u64, upload.expires))
            })
            .ok_or_else(not_found)??;
        session
            .project
            .reserve_segments(segments, self.config.segment_limit)?;
        stored.remove_upload(upload_id, key).ok_or_else(not_found)?;

        let object = StoredObject {
            key: key.to_owned(),
            created: now(),
            expires,
            data,
            custom,
            segments,
        };
        if let Some(old) = stored.put_object(object.clone()) {
            session.project.release_object(old.size(), old.segments);
        }
        info!(
            bucket = %bucket,
            key = %key,
            upload_id = %upload_id,
            parts = segments,
            size = object.size(),
            "multipart upload committed"
        );
        Ok(object.to_raw(true, true))
    }

    pub(crate) fn handle_abort_upload(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> LocalResult<()> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        validate_object_key(key)?;
        session.authorize(&Request::new(
            Action::Write,
            "abort_upload",
            Scope::Object(bucket, key),
        ))?;
        let removed = session
            .project
            .get_bucket(bucket)?
            .remove_upload(upload_id, key)
            .ok_or_else(|| LocalError::UploadNotFound {
                upload_id: upload_id.to_owned(),
            })?;
        session.project.release_storage(removed.total_size());
        info!(bucket = %bucket, key = %key, upload_id = %upload_id, "multipart upload aborted");
        Ok(())
    }

    pub(crate) fn handle_upload_part(
        &self,
        project: ProjectHandle,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
    ) -> LocalResult<PartUploadHandle> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        validate_object_key(key)?;
        session.authorize(&Request::new(Action::Write, "upload_part", Scope::Object(bucket, key)))?;
        session
            .project
            .get_bucket(bucket)?
            .with_upload(upload_id, key, |_| ())
            .ok_or_else(|| LocalError::UploadNotFound {
                upload_id: upload_id.to_owned(),
            })?;

        let stream = PartStream::new(
            Arc::clone(&session),
            bucket.to_owned(),
            key.to_owned(),
            upload_id.to_owned(),
            part_number,
        );
        debug!(
            bucket = %bucket,
            key = %key,
            upload_id = %upload_id,
            part_number,
            "part upload started"
        );
        Ok(self.universe.insert_part_upload(Arc::new(Mutex::new(stream))))
    }

    pub(crate) fn handle_part_upload_write(
        &self,
        part: PartUploadHandle,
        bytes: &[u8],
    ) -> LocalResult<usize> {
        self.universe.part_upload(part)?.lock().write(bytes)
    }

    pub(crate) fn handle_part_upload_set_etag(
        &self,
        part: PartUploadHandle,
        etag: &str,
    ) -> LocalResult<()> {
        self.universe.part_upload(part)?.lock().set_etag(etag)
    }

    pub(crate) fn handle_part_upload_commit(&self, part: PartUploadHandle) -> LocalResult<()> {
        self.universe.part_upload(part)?.lock().commit()
    }

    pub(crate) fn handle_part_upload_abort(&self, part: PartUploadHandle) -> LocalResult<()> {
        self.universe.part_upload(part)?.lock().abort()
    }

    pub(crate) fn handle_part_upload_info(&self, part: PartUploadHandle) -> LocalResult<RawPart> {
        Ok(self.universe.part_upload(part)?.lock().info())
    }
}
