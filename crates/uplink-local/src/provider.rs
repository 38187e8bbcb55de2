//! The in-process peer and its [`Boundary`] implementation.
//!
//! [`LocalUplink`] owns the simulated satellite and the table of live
//! handles. The trait impl here only decodes boundary arguments and wraps
//! outcomes; the behaviour lives in the `ops` handlers.

use std::collections::BTreeMap;
use std::ffi::CStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;
use uplink_sys::{
    AccessHandle, AccessResult, Boundary, BucketIteratorHandle, BucketResult, DownloadHandle,
    DownloadResult, EdgeCredentialsResult, EncryptionKeyHandle, EncryptionKeyResult,
    ObjectIteratorHandle, ObjectResult, PartIteratorHandle, PartResult, PartUploadHandle,
    PartUploadResult, ProjectHandle, ProjectResult, RawBucket, RawCommitUploadOptions, RawConfig,
    RawCustomMetadata, RawDownloadOptions, RawEdgeConfig, RawEdgeRegisterAccessOptions, RawError,
    RawListBucketsOptions, RawListObjectsOptions, RawListUploadPartsOptions,
    RawListUploadsOptions, RawObject, RawPart, RawPermission, RawResult, RawShareUrlOptions,
    RawSharePrefix, RawUploadInfo, RawUploadOptions, ReadResult, StringResult, UploadHandle,
    UploadInfoResult, UploadIteratorHandle, UploadResult, WriteResult,
};

use crate::config::LocalConfig;
use crate::cursor::Cursor;
use crate::convert::{
    custom_from_raw, into_optional_result, into_result, into_status, opt_text, text,
};
use crate::error::{LocalResult, eof, to_cstring};
use crate::grant::CaveatPath;
use crate::ops::{ListOptions, join_share_url};
use crate::state::Satellite;
use crate::universe::Universe;

/// An in-memory uplink peer.
///
/// # Examples
///
/// ```
/// use uplink_local::LocalUplink;
/// use uplink_sys::Boundary;
///
/// let peer = LocalUplink::default();
/// assert!(peer.internal_universe_is_empty());
/// assert_eq!(peer.open_sessions(), 0);
/// ```
#[derive(Debug)]
pub struct LocalUplink {
    pub(crate) config: Arc<LocalConfig>,
    pub(crate) satellite: Arc<Satellite>,
    pub(crate) universe: Universe,
    pub(crate) unclosed: AtomicUsize,
}

impl LocalUplink {
    /// A peer with its own empty satellite.
    #[must_use]
    pub fn new(config: LocalConfig) -> Self {
        let satellite = Satellite::new(config.satellite_address.clone(), &config.api_keys);
        debug!(
            satellite = %config.satellite_address,
            api_keys = config.api_keys.len(),
            "local uplink started"
        );
        Self {
            config: Arc::new(config),
            satellite: Arc::new(satellite),
            universe: Universe::new(),
            unclosed: AtomicUsize::new(0),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    /// Projects opened and never closed, including released ones.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.unclosed.load(Ordering::Acquire)
    }

    /// Bytes stored by the project behind `api_key`, including in-flight
    /// uploads and pending multipart parts.
    #[must_use]
    pub fn storage_used(&self, api_key: &str) -> Option<u64> {
        self.satellite.project(api_key).map(|p| p.storage_used())
    }

    /// Number of live handles of any kind.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.universe.len()
    }
}

impl Default for LocalUplink {
    fn default() -> Self {
        Self::new(LocalConfig::default())
    }
}

fn string_result(outcome: LocalResult<String>) -> StringResult {
    into_result(outcome.map(to_cstring))
}

fn write_result(outcome: LocalResult<usize>) -> WriteResult {
    match outcome {
        Ok(bytes_written) => WriteResult {
            bytes_written,
            error: None,
        },
        Err(e) => WriteResult {
            bytes_written: 0,
            error: Some(e.into_raw()),
        },
    }
}

fn user_agent(config: &RawConfig) -> LocalResult<Option<String>> {
    let agent = opt_text(config.user_agent.as_ref(), "user_agent")?;
    Ok((!agent.is_empty()).then(|| agent.to_owned()))
}

fn share_prefixes(prefixes: &[RawSharePrefix]) -> LocalResult<Vec<CaveatPath>> {
    prefixes
        .iter()
        .map(|p| {
            let prefix = opt_text(p.prefix.as_ref(), "prefix")?;
            Ok(CaveatPath {
                bucket: text(&p.bucket, "bucket")?.to_owned(),
                prefix: (!prefix.is_empty()).then(|| prefix.to_owned()),
            })
        })
        .collect()
}

fn list_options(options: Option<&RawListObjectsOptions>) -> LocalResult<ListOptions> {
    let Some(options) = options else {
        return Ok(ListOptions::default());
    };
    Ok(ListOptions {
        prefix: opt_text(options.prefix.as_ref(), "prefix")?.to_owned(),
        cursor: opt_text(options.cursor.as_ref(), "cursor")?.to_owned(),
        recursive: options.recursive,
        system: options.system,
        custom: options.custom,
    })
}

/// Run a decode-then-handle sequence as one fallible step.
fn attempt<T>(f: impl FnOnce() -> LocalResult<T>) -> LocalResult<T> {
    f()
}

fn free_value<T>(result: RawResult<T>, release: impl FnOnce(T)) {
    if let Some(value) = result.value {
        release(value);
    }
}

impl Boundary for LocalUplink {
    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    fn parse_access(&self, serialized: &CStr) -> AccessResult {
        into_result(text(serialized, "access").and_then(|s| self.handle_parse_access(s)))
    }

    fn request_access_with_passphrase(
        &self,
        satellite_address: &CStr,
        api_key: &CStr,
        passphrase: &CStr,
    ) -> AccessResult {
        self.config_request_access_with_passphrase(
            &RawConfig::default(),
            satellite_address,
            api_key,
            passphrase,
        )
    }

    fn config_request_access_with_passphrase(
        &self,
        config: &RawConfig,
        satellite_address: &CStr,
        api_key: &CStr,
        passphrase: &CStr,
    ) -> AccessResult {
        into_result(attempt(|| {
            let agent = user_agent(config)?;
            self.handle_request_access(
                agent.as_deref(),
                text(satellite_address, "satellite_address")?,
                text(api_key, "api_key")?,
                text(passphrase, "passphrase")?,
            )
        }))
    }

    fn access_satellite_address(&self, access: AccessHandle) -> StringResult {
        string_result(self.handle_access_satellite_address(access))
    }

    fn access_serialize(&self, access: AccessHandle) -> StringResult {
        string_result(self.handle_access_serialize(access))
    }

    fn access_share(
        &self,
        access: AccessHandle,
        permission: &RawPermission,
        prefixes: &[RawSharePrefix],
    ) -> AccessResult {
        into_result(
            share_prefixes(prefixes)
                .and_then(|paths| self.handle_access_share(access, permission, paths)),
        )
    }

    fn access_override_encryption_key(
        &self,
        access: AccessHandle,
        bucket: &CStr,
        prefix: &CStr,
        key: EncryptionKeyHandle,
    ) -> Option<RawError> {
        into_status(attempt(|| {
            self.handle_override_encryption_key(
                access,
                text(bucket, "bucket")?,
                text(prefix, "prefix")?,
                key,
            )
        }))
    }

    fn derive_encryption_key(&self, passphrase: &CStr, salt: &[u8]) -> EncryptionKeyResult {
        into_result(
            text(passphrase, "passphrase")
                .and_then(|p| self.handle_derive_encryption_key(p, salt)),
        )
    }

    fn free_access_result(&self, result: AccessResult) {
        free_value(result, |handle| {
            self.universe.remove_access(handle);
        });
    }

    fn free_encryption_key_result(&self, result: EncryptionKeyResult) {
        free_value(result, |handle| {
            self.universe.remove_encryption_key(handle);
        });
    }

    // -----------------------------------------------------------------------
    // Project
    // -----------------------------------------------------------------------

    fn open_project(&self, access: AccessHandle) -> ProjectResult {
        into_result(self.handle_open_project(access, None))
    }

    fn config_open_project(&self, config: &RawConfig, access: AccessHandle) -> ProjectResult {
        into_result(user_agent(config).and_then(|agent| self.handle_open_project(access, agent)))
    }

    fn close_project(&self, project: ProjectHandle) -> Option<RawError> {
        into_status(self.handle_close_project(project))
    }

    fn revoke_access(&self, project: ProjectHandle, access: AccessHandle) -> Option<RawError> {
        into_status(self.handle_revoke_access(project, access))
    }

    fn free_project_result(&self, result: ProjectResult) {
        free_value(result, |handle| self.release_project(handle));
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    fn stat_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult {
        into_result(text(bucket, "bucket").and_then(|b| self.handle_stat_bucket(project, b)))
    }

    fn create_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult {
        into_result(text(bucket, "bucket").and_then(|b| self.handle_create_bucket(project, b)))
    }

    fn ensure_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult {
        into_result(text(bucket, "bucket").and_then(|b| self.handle_ensure_bucket(project, b)))
    }

    fn delete_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult {
        into_result(
            text(bucket, "bucket").and_then(|b| self.handle_delete_bucket(project, b, false)),
        )
    }

    fn delete_bucket_with_objects(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult {
        into_result(
            text(bucket, "bucket").and_then(|b| self.handle_delete_bucket(project, b, true)),
        )
    }

    fn list_buckets(
        &self,
        project: ProjectHandle,
        options: Option<&RawListBucketsOptions>,
    ) -> BucketIteratorHandle {
        let cursor = options
            .map_or(Ok(""), |o| opt_text(o.cursor.as_ref(), "cursor"))
            .map(str::to_owned);
        match cursor {
            Ok(cursor) => self.handle_list_buckets(project, cursor),
            Err(e) => self
                .universe
                .insert_bucket_iterator(Arc::new(Mutex::new(Cursor::failed(e)))),
        }
    }

    fn bucket_iterator_next(&self, iterator: BucketIteratorHandle) -> bool {
        self.universe
            .bucket_iterator(iterator)
            .is_ok_and(|cursor| cursor.lock().next())
    }

    fn bucket_iterator_item(&self, iterator: BucketIteratorHandle) -> Option<RawBucket> {
        self.universe
            .bucket_iterator(iterator)
            .ok()
            .and_then(|cursor| cursor.lock().item())
    }

    fn bucket_iterator_err(&self, iterator: BucketIteratorHandle) -> Option<RawError> {
        match self.universe.bucket_iterator(iterator) {
            Ok(cursor) => cursor.lock().err(),
            Err(e) => Some(e.into_raw()),
        }
    }

    fn free_bucket_iterator(&self, iterator: BucketIteratorHandle) {
        self.universe.remove_bucket_iterator(iterator);
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    fn stat_object(&self, project: ProjectHandle, bucket: &CStr, key: &CStr) -> ObjectResult {
        into_result(attempt(|| {
            self.handle_stat_object(project, text(bucket, "bucket")?, text(key, "key")?)
        }))
    }

    fn delete_object(&self, project: ProjectHandle, bucket: &CStr, key: &CStr) -> ObjectResult {
        into_optional_result(attempt(|| {
            self.handle_delete_object(project, text(bucket, "bucket")?, text(key, "key")?)
        }))
    }

    fn update_object_metadata(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        metadata: &RawCustomMetadata,
    ) -> Option<RawError> {
        into_status(attempt(|| {
            self.handle_update_object_metadata(
                project,
                text(bucket, "bucket")?,
                text(key, "key")?,
                custom_from_raw(metadata)?,
            )
        }))
    }

    fn copy_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        new_bucket: &CStr,
        new_key: &CStr,
    ) -> ObjectResult {
        into_result(attempt(|| {
            self.handle_copy_object(
                project,
                text(bucket, "bucket")?,
                text(key, "key")?,
                text(new_bucket, "new_bucket")?,
                text(new_key, "new_key")?,
            )
        }))
    }

    fn move_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        new_bucket: &CStr,
        new_key: &CStr,
    ) -> Option<RawError> {
        into_status(attempt(|| {
            self.handle_move_object(
                project,
                text(bucket, "bucket")?,
                text(key, "key")?,
                text(new_bucket, "new_bucket")?,
                text(new_key, "new_key")?,
            )
        }))
    }

    fn list_objects(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        options: Option<&RawListObjectsOptions>,
    ) -> ObjectIteratorHandle {
        let decoded = text(bucket, "bucket")
            .map(str::to_owned)
            .and_then(|b| Ok((b, list_options(options)?)));
        match decoded {
            Ok((bucket, options)) => self.handle_list_objects(project, bucket, options),
            Err(e) => self
                .universe
                .insert_object_iterator(Arc::new(Mutex::new(Cursor::failed(e)))),
        }
    }

    fn object_iterator_next(&self, iterator: ObjectIteratorHandle) -> bool {
        self.universe
            .object_iterator(iterator)
            .is_ok_and(|cursor| cursor.lock().next())
    }

    fn object_iterator_item(&self, iterator: ObjectIteratorHandle) -> Option<RawObject> {
        self.universe
            .object_iterator(iterator)
            .ok()
            .and_then(|cursor| cursor.lock().item())
    }

    fn object_iterator_err(&self, iterator: ObjectIteratorHandle) -> Option<RawError> {
        match self.universe.object_iterator(iterator) {
            Ok(cursor) => cursor.lock().err(),
            Err(e) => Some(e.into_raw()),
        }
    }

    fn free_object_iterator(&self, iterator: ObjectIteratorHandle) {
        self.universe.remove_object_iterator(iterator);
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    fn upload_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawUploadOptions>,
    ) -> UploadResult {
        let expires = options.map_or(0, |o| o.expires);
        into_result(attempt(|| {
            self.handle_upload_object(project, text(bucket, "bucket")?, text(key, "key")?, expires)
        }))
    }

    fn upload_write(&self, upload: UploadHandle, bytes: &[u8]) -> WriteResult {
        write_result(self.handle_upload_write(upload, bytes))
    }

    fn upload_set_custom_metadata(
        &self,
        upload: UploadHandle,
        metadata: &RawCustomMetadata,
    ) -> Option<RawError> {
        into_status(
            custom_from_raw(metadata)
                .and_then(|custom| self.handle_upload_set_custom_metadata(upload, custom)),
        )
    }

    fn upload_commit(&self, upload: UploadHandle) -> Option<RawError> {
        into_status(self.handle_upload_commit(upload))
    }

    fn upload_abort(&self, upload: UploadHandle) -> Option<RawError> {
        into_status(self.handle_upload_abort(upload))
    }

    fn upload_info(&self, upload: UploadHandle) -> ObjectResult {
        into_result(self.handle_upload_info(upload))
    }

    fn free_upload_result(&self, result: UploadResult) {
        free_value(result, |handle| {
            self.universe.remove_upload(handle);
        });
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    fn download_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawDownloadOptions>,
    ) -> DownloadResult {
        let range = options.copied().unwrap_or_default();
        into_result(attempt(|| {
            self.handle_download_object(
                project,
                text(bucket, "bucket")?,
                text(key, "key")?,
                range.offset,
                range.length,
            )
        }))
    }

    fn download_read(&self, download: DownloadHandle, buffer: &mut [u8]) -> ReadResult {
        match self.handle_download_read(download, buffer) {
            Ok(chunk) => ReadResult {
                bytes_read: chunk.bytes_read,
                error: chunk.eof.then(eof),
            },
            Err(e) => ReadResult {
                bytes_read: 0,
                error: Some(e.into_raw()),
            },
        }
    }

    fn download_info(&self, download: DownloadHandle) -> ObjectResult {
        into_result(self.handle_download_info(download))
    }

    fn close_download(&self, download: DownloadHandle) -> Option<RawError> {
        into_status(self.handle_close_download(download))
    }

    fn free_download_result(&self, result: DownloadResult) {
        free_value(result, |handle| {
            self.universe.remove_download(handle);
        });
    }

    // -----------------------------------------------------------------------
    // Multipart
    // -----------------------------------------------------------------------

    fn begin_upload(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawUploadOptions>,
    ) -> UploadInfoResult {
        let expires = options.map_or(0, |o| o.expires);
        into_result(attempt(|| {
            self.handle_begin_upload(project, text(bucket, "bucket")?, text(key, "key")?, expires)
        }))
    }

    fn commit_upload(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
        options: Option<&RawCommitUploadOptions>,
    ) -> ObjectResult {
        into_result(attempt(|| {
            let custom = match options {
                Some(o) => custom_from_raw(&o.custom_metadata)?,
                None => BTreeMap::new(),
            };
            self.handle_commit_upload(
                project,
                text(bucket, "bucket")?,
                text(key, "key")?,
                text(upload_id, "upload_id")?,
                custom,
            )
        }))
    }

    fn abort_upload(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
    ) -> Option<RawError> {
        into_status(attempt(|| {
            self.handle_abort_upload(
                project,
                text(bucket, "bucket")?,
                text(key, "key")?,
                text(upload_id, "upload_id")?,
            )
        }))
    }

    fn upload_part(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
        part_number: u32,
    ) -> PartUploadResult {
        into_result(attempt(|| {
            self.handle_upload_part(
                project,
                text(bucket, "bucket")?,
                text(key, "key")?,
                text(upload_id, "upload_id")?,
                part_number,
            )
        }))
    }

    fn part_upload_write(&self, part: PartUploadHandle, bytes: &[u8]) -> WriteResult {
        write_result(self.handle_part_upload_write(part, bytes))
    }

    fn part_upload_set_etag(&self, part: PartUploadHandle, etag: &CStr) -> Option<RawError> {
        into_status(text(etag, "etag").and_then(|e| self.handle_part_upload_set_etag(part, e)))
    }

    fn part_upload_commit(&self, part: PartUploadHandle) -> Option<RawError> {
        into_status(self.handle_part_upload_commit(part))
    }

    fn part_upload_abort(&self, part: PartUploadHandle) -> Option<RawError> {
        into_status(self.handle_part_upload_abort(part))
    }

    fn part_upload_info(&self, part: PartUploadHandle) -> PartResult {
        into_result(self.handle_part_upload_info(part))
    }

    fn free_part_upload_result(&self, result: PartUploadResult) {
        free_value(result, |handle| {
            self.universe.remove_part_upload(handle);
        });
    }

    fn list_uploads(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        options: Option<&RawListUploadsOptions>,
    ) -> UploadIteratorHandle {
        let decoded = text(bucket, "bucket")
            .map(str::to_owned)
            .and_then(|b| Ok((b, list_options(options)?)));
        match decoded {
            Ok((bucket, options)) => self.handle_list_uploads(project, bucket, options),
            Err(e) => self
                .universe
                .insert_upload_iterator(Arc::new(Mutex::new(Cursor::failed(e)))),
        }
    }

    fn upload_iterator_next(&self, iterator: UploadIteratorHandle) -> bool {
        self.universe
            .upload_iterator(iterator)
            .is_ok_and(|cursor| cursor.lock().next())
    }

    fn upload_iterator_item(&self, iterator: UploadIteratorHandle) -> Option<RawUploadInfo> {
        self.universe
            .upload_iterator(iterator)
            .ok()
            .and_then(|cursor| cursor.lock().item())
    }

    fn upload_iterator_err(&self, iterator: UploadIteratorHandle) -> Option<RawError> {
        match self.universe.upload_iterator(iterator) {
            Ok(cursor) => cursor.lock().err(),
            Err(e) => Some(e.into_raw()),
        }
    }

    fn free_upload_iterator(&self, iterator: UploadIteratorHandle) {
        self.universe.remove_upload_iterator(iterator);
    }

    fn list_upload_parts(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
        options: Option<&RawListUploadPartsOptions>,
    ) -> PartIteratorHandle {
        let cursor = options.map_or(0, |o| o.cursor);
        let decoded = attempt(|| {
            Ok((
                text(bucket, "bucket")?.to_owned(),
                text(key, "key")?.to_owned(),
                text(upload_id, "upload_id")?.to_owned(),
            ))
        });
        match decoded {
            Ok((bucket, key, upload_id)) => {
                self.handle_list_upload_parts(project, bucket, key, upload_id, cursor)
            }
            Err(e) => self
                .universe
                .insert_part_iterator(Arc::new(Mutex::new(Cursor::failed(e)))),
        }
    }

    fn part_iterator_next(&self, iterator: PartIteratorHandle) -> bool {
        self.universe
            .part_iterator(iterator)
            .is_ok_and(|cursor| cursor.lock().next())
    }

    fn part_iterator_item(&self, iterator: PartIteratorHandle) -> Option<RawPart> {
        self.universe
            .part_iterator(iterator)
            .ok()
            .and_then(|cursor| cursor.lock().item())
    }

    fn part_iterator_err(&self, iterator: PartIteratorHandle) -> Option<RawError> {
        match self.universe.part_iterator(iterator) {
            Ok(cursor) => cursor.lock().err(),
            Err(e) => Some(e.into_raw()),
        }
    }

    fn free_part_iterator(&self, iterator: PartIteratorHandle) {
        self.universe.remove_part_iterator(iterator);
    }

    // -----------------------------------------------------------------------
    // Edge
    // -----------------------------------------------------------------------

    fn edge_register_access(
        &self,
        config: &RawEdgeConfig,
        access: AccessHandle,
        options: Option<&RawEdgeRegisterAccessOptions>,
    ) -> EdgeCredentialsResult {
        let is_public = options.is_some_and(|o| o.is_public);
        into_result(
            text(&config.auth_service_address, "auth_service_address")
                .and_then(|address| self.handle_edge_register_access(address, access, is_public)),
        )
    }

    fn edge_join_share_url(
        &self,
        base_url: &CStr,
        access_key_id: &CStr,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawShareUrlOptions>,
    ) -> StringResult {
        let raw = options.is_some_and(|o| o.raw);
        string_result(attempt(|| {
            join_share_url(
                text(base_url, "base_url")?,
                text(access_key_id, "access_key_id")?,
                text(bucket, "bucket")?,
                text(key, "key")?,
                raw,
            )
        }))
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    fn internal_universe_is_empty(&self) -> bool {
        self.universe.is_empty()
    }
}
