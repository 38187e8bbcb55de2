//! The native library call surface.
//!
//! Each method mirrors one exported function of the library. Calls are
//! synchronous and may block on network I/O. Handles passed in must have
//! been issued by the same implementation; the library reports misuse as
//! [`ERROR_INVALID_HANDLE`](crate::codes::ERROR_INVALID_HANDLE).
//!
//! `free_*` methods for results that carry no handle have default bodies
//! that simply drop the value.

use std::ffi::CStr;
use std::fmt;

use crate::handle::{
    AccessHandle, BucketIteratorHandle, DownloadHandle, EncryptionKeyHandle,
    ObjectIteratorHandle, PartIteratorHandle, PartUploadHandle, ProjectHandle,
    UploadHandle, UploadIteratorHandle,
};
use crate::result::{
    AccessResult, BucketResult, DownloadResult, EdgeCredentialsResult, EncryptionKeyResult,
    ObjectResult, PartResult, PartUploadResult, ProjectResult, ReadResult, StringResult,
    UploadInfoResult, UploadResult, WriteResult,
};
use crate::types::{
    RawBucket, RawCommitUploadOptions, RawConfig, RawCustomMetadata, RawDownloadOptions,
    RawEdgeConfig, RawEdgeRegisterAccessOptions, RawError, RawListBucketsOptions,
    RawListObjectsOptions, RawListUploadPartsOptions, RawListUploadsOptions, RawObject, RawPart,
    RawPermission, RawShareUrlOptions, RawSharePrefix, RawUploadInfo, RawUploadOptions,
};

/// The native uplink library.
pub trait Boundary: Send + Sync + fmt::Debug {
    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// Decode a serialized access grant.
    fn parse_access(&self, serialized: &CStr) -> AccessResult;

    /// Request an access grant from a satellite.
    fn request_access_with_passphrase(
        &self,
        satellite_address: &CStr,
        api_key: &CStr,
        passphrase: &CStr,
    ) -> AccessResult;

    /// Request an access grant using connection configuration.
    fn config_request_access_with_passphrase(
        &self,
        config: &RawConfig,
        satellite_address: &CStr,
        api_key: &CStr,
        passphrase: &CStr,
    ) -> AccessResult;

    /// Satellite address of an access.
    fn access_satellite_address(&self, access: AccessHandle) -> StringResult;

    /// Serialize an access to its string form.
    fn access_serialize(&self, access: AccessHandle) -> StringResult;

    /// Derive a restricted access. An empty prefix slice is unrestricted.
    fn access_share(
        &self,
        access: AccessHandle,
        permission: &RawPermission,
        prefixes: &[RawSharePrefix],
    ) -> AccessResult;

    /// Install an encryption key for a bucket and key prefix.
    fn access_override_encryption_key(
        &self,
        access: AccessHandle,
        bucket: &CStr,
        prefix: &CStr,
        key: EncryptionKeyHandle,
    ) -> Option<RawError>;

    /// Derive an encryption key from a passphrase and salt.
    fn derive_encryption_key(&self, passphrase: &CStr, salt: &[u8]) -> EncryptionKeyResult;

    /// Release an access result and its handle.
    fn free_access_result(&self, result: AccessResult);

    /// Release an encryption key result and its handle.
    fn free_encryption_key_result(&self, result: EncryptionKeyResult);

    // -----------------------------------------------------------------------
    // Project
    // -----------------------------------------------------------------------

    /// Open a project session.
    fn open_project(&self, access: AccessHandle) -> ProjectResult;

    /// Open a project session using connection configuration.
    fn config_open_project(&self, config: &RawConfig, access: AccessHandle) -> ProjectResult;

    /// Close a project session.
    fn close_project(&self, project: ProjectHandle) -> Option<RawError>;

    /// Revoke a previously shared access.
    fn revoke_access(&self, project: ProjectHandle, access: AccessHandle) -> Option<RawError>;

    /// Release a project result and its handle.
    fn free_project_result(&self, result: ProjectResult);

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    /// Look up a bucket.
    fn stat_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult;

    /// Create a bucket; fails if it exists.
    fn create_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult;

    /// Create a bucket unless it exists.
    fn ensure_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult;

    /// Delete an empty bucket.
    fn delete_bucket(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult;

    /// Delete a bucket and everything in it.
    fn delete_bucket_with_objects(&self, project: ProjectHandle, bucket: &CStr) -> BucketResult;

    /// Start a bucket listing.
    fn list_buckets(
        &self,
        project: ProjectHandle,
        options: Option<&RawListBucketsOptions>,
    ) -> BucketIteratorHandle;

    /// Advance a bucket listing.
    fn bucket_iterator_next(&self, iterator: BucketIteratorHandle) -> bool;

    /// Current bucket of a listing.
    fn bucket_iterator_item(&self, iterator: BucketIteratorHandle) -> Option<RawBucket>;

    /// Terminal error of a bucket listing.
    fn bucket_iterator_err(&self, iterator: BucketIteratorHandle) -> Option<RawError>;

    /// Release a bucket listing.
    fn free_bucket_iterator(&self, iterator: BucketIteratorHandle);

    /// Release a bucket result.
    fn free_bucket_result(&self, result: BucketResult) {
        drop(result);
    }

    /// Release a bucket yielded by a listing.
    fn free_bucket(&self, bucket: RawBucket) {
        drop(bucket);
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Look up an object.
    fn stat_object(&self, project: ProjectHandle, bucket: &CStr, key: &CStr) -> ObjectResult;

    /// Delete an object. A missing object yields an empty success.
    fn delete_object(&self, project: ProjectHandle, bucket: &CStr, key: &CStr) -> ObjectResult;

    /// Replace the custom metadata of an object.
    fn update_object_metadata(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        metadata: &RawCustomMetadata,
    ) -> Option<RawError>;

    /// Copy an object.
    fn copy_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        new_bucket: &CStr,
        new_key: &CStr,
    ) -> ObjectResult;

    /// Move an object.
    fn move_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        new_bucket: &CStr,
        new_key: &CStr,
    ) -> Option<RawError>;

    /// Start an object listing.
    fn list_objects(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        options: Option<&RawListObjectsOptions>,
    ) -> ObjectIteratorHandle;

    /// Advance an object listing.
    fn object_iterator_next(&self, iterator: ObjectIteratorHandle) -> bool;

    /// Current object of a listing.
    fn object_iterator_item(&self, iterator: ObjectIteratorHandle) -> Option<RawObject>;

    /// Terminal error of an object listing.
    fn object_iterator_err(&self, iterator: ObjectIteratorHandle) -> Option<RawError>;

    /// Release an object listing.
    fn free_object_iterator(&self, iterator: ObjectIteratorHandle);

    /// Release an object result.
    fn free_object_result(&self, result: ObjectResult) {
        drop(result);
    }

    /// Release an object yielded by a listing.
    fn free_object(&self, object: RawObject) {
        drop(object);
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Open an upload stream.
    fn upload_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawUploadOptions>,
    ) -> UploadResult;

    /// Write to an upload stream. May accept fewer bytes than offered.
    fn upload_write(&self, upload: UploadHandle, bytes: &[u8]) -> WriteResult;

    /// Set the custom metadata that commit will store.
    fn upload_set_custom_metadata(
        &self,
        upload: UploadHandle,
        metadata: &RawCustomMetadata,
    ) -> Option<RawError>;

    /// Commit an upload stream.
    fn upload_commit(&self, upload: UploadHandle) -> Option<RawError>;

    /// Abort an upload stream.
    fn upload_abort(&self, upload: UploadHandle) -> Option<RawError>;

    /// Snapshot of the object being uploaded.
    fn upload_info(&self, upload: UploadHandle) -> ObjectResult;

    /// Release an upload result and its handle.
    fn free_upload_result(&self, result: UploadResult);

    /// Release a write result.
    fn free_write_result(&self, result: WriteResult) {
        drop(result);
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    /// Open a download stream.
    fn download_object(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawDownloadOptions>,
    ) -> DownloadResult;

    /// Read into `buffer`; returns the number of bytes produced.
    fn download_read(&self, download: DownloadHandle, buffer: &mut [u8]) -> ReadResult;

    /// Snapshot of the object being downloaded.
    fn download_info(&self, download: DownloadHandle) -> ObjectResult;

    /// Close a download stream.
    fn close_download(&self, download: DownloadHandle) -> Option<RawError>;

    /// Release a download result and its handle.
    fn free_download_result(&self, result: DownloadResult);

    /// Release a read result.
    fn free_read_result(&self, result: ReadResult) {
        drop(result);
    }

    // -----------------------------------------------------------------------
    // Multipart
    // -----------------------------------------------------------------------

    /// Start a multipart upload.
    fn begin_upload(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawUploadOptions>,
    ) -> UploadInfoResult;

    /// Assemble the committed parts of a multipart upload.
    fn commit_upload(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
        options: Option<&RawCommitUploadOptions>,
    ) -> ObjectResult;

    /// Discard a multipart upload and its parts.
    fn abort_upload(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
    ) -> Option<RawError>;

    /// Open a part upload stream.
    fn upload_part(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
        part_number: u32,
    ) -> PartUploadResult;

    /// Write to a part upload stream. May accept fewer bytes than offered.
    fn part_upload_write(&self, part: PartUploadHandle, bytes: &[u8]) -> WriteResult;

    /// Set the entity tag that commit will store.
    fn part_upload_set_etag(&self, part: PartUploadHandle, etag: &CStr) -> Option<RawError>;

    /// Commit a part.
    fn part_upload_commit(&self, part: PartUploadHandle) -> Option<RawError>;

    /// Abort a part.
    fn part_upload_abort(&self, part: PartUploadHandle) -> Option<RawError>;

    /// Snapshot of the part being uploaded.
    fn part_upload_info(&self, part: PartUploadHandle) -> PartResult;

    /// Release a part upload result and its handle.
    fn free_part_upload_result(&self, result: PartUploadResult);

    /// Release a part result.
    fn free_part_result(&self, result: PartResult) {
        drop(result);
    }

    /// Release an upload info result.
    fn free_upload_info_result(&self, result: UploadInfoResult) {
        drop(result);
    }

    /// Start a pending upload listing.
    fn list_uploads(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        options: Option<&RawListUploadsOptions>,
    ) -> UploadIteratorHandle;

    /// Advance a pending upload listing.
    fn upload_iterator_next(&self, iterator: UploadIteratorHandle) -> bool;

    /// Current entry of a pending upload listing.
    fn upload_iterator_item(&self, iterator: UploadIteratorHandle) -> Option<RawUploadInfo>;

    /// Terminal error of a pending upload listing.
    fn upload_iterator_err(&self, iterator: UploadIteratorHandle) -> Option<RawError>;

    /// Release a pending upload listing.
    fn free_upload_iterator(&self, iterator: UploadIteratorHandle);

    /// Release an upload info yielded by a listing.
    fn free_upload_info(&self, info: RawUploadInfo) {
        drop(info);
    }

    /// Start a committed part listing.
    fn list_upload_parts(
        &self,
        project: ProjectHandle,
        bucket: &CStr,
        key: &CStr,
        upload_id: &CStr,
        options: Option<&RawListUploadPartsOptions>,
    ) -> PartIteratorHandle;

    /// Advance a part listing.
    fn part_iterator_next(&self, iterator: PartIteratorHandle) -> bool;

    /// Current part of a listing.
    fn part_iterator_item(&self, iterator: PartIteratorHandle) -> Option<RawPart>;

    /// Terminal error of a part listing.
    fn part_iterator_err(&self, iterator: PartIteratorHandle) -> Option<RawError>;

    /// Release a part listing.
    fn free_part_iterator(&self, iterator: PartIteratorHandle);

    /// Release a part yielded by a listing.
    fn free_part(&self, part: RawPart) {
        drop(part);
    }

    // -----------------------------------------------------------------------
    // Edge
    // -----------------------------------------------------------------------

    /// Register an access with the edge auth service.
    fn edge_register_access(
        &self,
        config: &RawEdgeConfig,
        access: AccessHandle,
        options: Option<&RawEdgeRegisterAccessOptions>,
    ) -> EdgeCredentialsResult;

    /// Build a linksharing URL. Empty `bucket`/`key` are omitted.
    fn edge_join_share_url(
        &self,
        base_url: &CStr,
        access_key_id: &CStr,
        bucket: &CStr,
        key: &CStr,
        options: Option<&RawShareUrlOptions>,
    ) -> StringResult;

    /// Release an edge credentials result.
    fn free_edge_credentials_result(&self, result: EdgeCredentialsResult) {
        drop(result);
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    /// Release a string result.
    fn free_string_result(&self, result: StringResult) {
        drop(result);
    }

    /// Release an error returned by an error-only call.
    fn free_error(&self, error: RawError) {
        drop(error);
    }

    /// Whether no handle issued by the library is still live.
    fn internal_universe_is_empty(&self) -> bool;
}
