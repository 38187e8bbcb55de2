//! Paired `{value, error}` result structs and their release calls.
//!
//! Every struct returned by the library owns foreign memory. Exactly one
//! `free_*` call must release it once the caller has read what it needs,
//! whichever branch was taken. [`Release`] records which call that is.

use std::ffi::CString;

use crate::Boundary;
use crate::handle::{
    AccessHandle, BucketIteratorHandle, DownloadHandle, EncryptionKeyHandle,
    ObjectIteratorHandle, PartIteratorHandle, PartUploadHandle, ProjectHandle,
    UploadHandle, UploadIteratorHandle,
};
use crate::types::{
    RawBucket, RawEdgeCredentials, RawError, RawObject, RawPart, RawUploadInfo,
};

/// A value-or-null paired with an error-or-null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult<T> {
    /// The value, when the call produced one.
    pub value: Option<T>,
    /// The error, when the call failed.
    pub error: Option<RawError>,
}

impl<T> RawResult<T> {
    /// A successful result.
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    /// A successful result carrying no value.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            value: None,
            error: None,
        }
    }

    /// A failed result.
    #[must_use]
    pub fn err(error: RawError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }
}

/// Result of `parse_access`, `request_access_*` and `access_share`.
pub type AccessResult = RawResult<AccessHandle>;
/// Result of `open_project` and `config_open_project`.
pub type ProjectResult = RawResult<ProjectHandle>;
/// Result of bucket operations.
pub type BucketResult = RawResult<RawBucket>;
/// Result of object operations, stream `info` and `commit_upload`.
pub type ObjectResult = RawResult<RawObject>;
/// Result of `upload_object`.
pub type UploadResult = RawResult<UploadHandle>;
/// Result of `download_object`.
pub type DownloadResult = RawResult<DownloadHandle>;
/// Result of `upload_part`.
pub type PartUploadResult = RawResult<PartUploadHandle>;
/// Result of `begin_upload`.
pub type UploadInfoResult = RawResult<RawUploadInfo>;
/// Result of `part_upload_info`.
pub type PartResult = RawResult<RawPart>;
/// Result of calls returning a string.
pub type StringResult = RawResult<CString>;
/// Result of `derive_encryption_key`.
pub type EncryptionKeyResult = RawResult<EncryptionKeyHandle>;
/// Result of `edge_register_access`.
pub type EdgeCredentialsResult = RawResult<RawEdgeCredentials>;

/// Result of a stream write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    /// Bytes accepted by this call.
    pub bytes_written: usize,
    /// The error, when the write failed.
    pub error: Option<RawError>,
}

/// Result of a stream read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// Bytes produced by this call.
    pub bytes_read: usize,
    /// The error; code [`EOF`](crate::codes::EOF) marks the end of the stream.
    pub error: Option<RawError>,
}

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

/// Foreign memory freed by exactly one boundary call.
pub trait Release: Sized {
    /// Hand the value back to the library.
    fn release(self, boundary: &dyn Boundary);
}

macro_rules! impl_release {
    ($($ty:ty => $free:ident),* $(,)?) => {
        $(
            impl Release for $ty {
                fn release(self, boundary: &dyn Boundary) {
                    boundary.$free(self);
                }
            }
        )*
    };
}

impl_release! {
    AccessResult => free_access_result,
    ProjectResult => free_project_result,
    BucketResult => free_bucket_result,
    ObjectResult => free_object_result,
    UploadResult => free_upload_result,
    DownloadResult => free_download_result,
    PartUploadResult => free_part_upload_result,
    UploadInfoResult => free_upload_info_result,
    PartResult => free_part_result,
    StringResult => free_string_result,
    EncryptionKeyResult => free_encryption_key_result,
    EdgeCredentialsResult => free_edge_credentials_result,
    WriteResult => free_write_result,
    ReadResult => free_read_result,
    RawError => free_error,
    RawBucket => free_bucket,
    RawObject => free_object,
    RawUploadInfo => free_upload_info,
    RawPart => free_part,
    BucketIteratorHandle => free_bucket_iterator,
    ObjectIteratorHandle => free_object_iterator,
    UploadIteratorHandle => free_upload_iterator,
    PartIteratorHandle => free_part_iterator,
}
