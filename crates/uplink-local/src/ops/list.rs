//! Listing handlers.
//!
//! Every listing returns a cursor whose work happens on the first advance,
//! so failures (bad handle, missing bucket, denied permission) surface
//! through the iterator's `err`. Entries the grant cannot see are
//! filtered out rather than failing the listing.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use uplink_sys::{
    BucketIteratorHandle, ObjectIteratorHandle, PartIteratorHandle, ProjectHandle, RawBucket,
    RawObject, RawPart, RawUploadInfo, UploadIteratorHandle,
};

use crate::convert::now;
use crate::cursor::Cursor;
use crate::error::{LocalError, LocalResult};
use crate::grant::{Action, Request, Scope};
use crate::provider::LocalUplink;
use crate::session::Session;
use crate::state::listing::{ListEntry, list_sorted};
use crate::state::multipart::prefix_upload;
use crate::state::object::prefix_object;
use crate::validation::{validate_bucket_name, validate_object_key};

/// Decoded object and pending upload listing options.
#[derive(Debug, Clone, Default)]
pub(crate) struct ListOptions {
    pub prefix: String,
    pub cursor: String,
    pub recursive: bool,
    pub system: bool,
    pub custom: bool,
}

fn authorize_listing(
    session: &Session,
    operation: &'static str,
    bucket: &str,
    prefix: &str,
) -> LocalResult<()> {
    validate_bucket_name(bucket)?;
    session.authorize(&Request::new(Action::List, operation, Scope::Listing(bucket, prefix)))
}

impl LocalUplink {
    pub(crate) fn handle_list_buckets(
        &self,
        project: ProjectHandle,
        cursor: String,
    ) -> BucketIteratorHandle {
        let listing = match self.universe.project(project) {
            Ok(session) => Cursor::new(move || {
                session.authorize(&Request::new(Action::List, "list_buckets", Scope::Project))?;
                let buckets: Vec<RawBucket> = session
                    .project
                    .list_buckets()
                    .into_iter()
                    .filter(|b| b.name > cursor)
                    .filter(|b| session.grant.admits(Scope::Bucket(&b.name)))
                    .map(|b| b.to_raw())
                    .collect();
                debug!(count = buckets.len(), "list_buckets completed");
                Ok(buckets)
            }),
            Err(e) => Cursor::failed(e),
        };
        self.universe
            .insert_bucket_iterator(Arc::new(Mutex::new(listing)))
    }

    pub(crate) fn handle_list_objects(
        &self,
        project: ProjectHandle,
        bucket: String,
        options: ListOptions,
    ) -> ObjectIteratorHandle {
        let listing = match self.universe.project(project) {
            Ok(session) => Cursor::new(move || {
                authorize_listing(&session, "list_objects", &bucket, &options.prefix)?;
                let stored = session.project.get_bucket(&bucket)?;
                let objects = stored.with_objects(now(), |live| {
                    list_sorted(live, &options.prefix, &options.cursor, options.recursive)
                        .into_iter()
                        .filter_map(|entry| match entry {
                            ListEntry::Item(object) => session
                                .grant
                                .admits(Scope::Object(&bucket, &object.key))
                                .then(|| object.to_raw(options.system, options.custom)),
                            ListEntry::Prefix(prefix) => session
                                .grant
                                .admits(Scope::Listing(&bucket, &prefix))
                                .then(|| prefix_object(&prefix)),
                        })
                        .collect::<Vec<RawObject>>()
                });
                debug!(
                    bucket = %bucket,
                    prefix = %options.prefix,
                    count = objects.len(),
                    "list_objects completed"
                );
                Ok(objects)
            }),
            Err(e) => Cursor::failed(e),
        };
        self.universe
            .insert_object_iterator(Arc::new(Mutex::new(listing)))
    }

    pub(crate) fn handle_list_uploads(
        &self,
        project: ProjectHandle,
        bucket: String,
        options: ListOptions,
    ) -> UploadIteratorHandle {
        let listing = match self.universe.project(project) {
            Ok(session) => Cursor::new(move || {
                authorize_listing(&session, "list_uploads", &bucket, &options.prefix)?;
                let pending = session.project.get_bucket(&bucket)?.pending_uploads();
                let uploads: Vec<RawUploadInfo> = list_sorted(
                    pending.iter().map(|u| (u.key.as_str(), u)),
                    &options.prefix,
                    &options.cursor,
                    options.recursive,
                )
                .into_iter()
                .filter_map(|entry| match entry {
                    ListEntry::Item(upload) => session
                        .grant
                        .admits(Scope::Object(&bucket, &upload.key))
                        .then(|| upload.to_raw(options.system)),
                    ListEntry::Prefix(prefix) => session
                        .grant
                        .admits(Scope::Listing(&bucket, &prefix))
                        .then(|| prefix_upload(&prefix)),
                })
                .collect();
                debug!(bucket = %bucket, count = uploads.len(), "list_uploads completed");
                Ok(uploads)
            }),
            Err(e) => Cursor::failed(e),
        };
        self.universe
            .insert_upload_iterator(Arc::new(Mutex::new(listing)))
    }

    pub(crate) fn handle_list_upload_parts(
        &self,
        project: ProjectHandle,
        bucket: String,
        key: String,
        upload_id: String,
        cursor: u32,
    ) -> PartIteratorHandle {
        let listing = match self.universe.project(project) {
            Ok(session) => Cursor::new(move || {
                validate_bucket_name(&bucket)?;
                validate_object_key(&key)?;
                session.authorize(&Request::new(
                    Action::List,
                    "list_upload_parts",
                    Scope::Object(&bucket, &key),
                ))?;
                let parts = session
                    .project
                    .get_bucket(&bucket)?
                    .with_upload(&upload_id, &key, |upload| {
                        upload
                            .parts
                            .range(cursor.saturating_add(1)..)
                            .map(|(_, part)| part.to_raw())
                            .collect::<Vec<RawPart>>()
                    })
                    .ok_or_else(|| LocalError::UploadNotFound {
                        upload_id: upload_id.clone(),
                    })?;
                debug!(
                    bucket = %bucket,
                    key = %key,
                    count = parts.len(),
                    "list_upload_parts completed"
                );
                Ok(parts)
            }),
            Err(e) => Cursor::failed(e),
        };
        self.universe
            .insert_part_iterator(Arc::new(Mutex::new(listing)))
    }
}
