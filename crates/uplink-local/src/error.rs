//! Errors produced by the in-process peer.
//!
//! Every [`LocalError`] variant maps to one numeric code of the native
//! contract. [`LocalError::into_raw`] turns it into the [`RawError`] handed
//! back across the boundary; the message is the `Display` text.

use std::ffi::CString;

use uplink_sys::RawError;
use uplink_sys::codes;

/// Peer error type.
#[derive(Debug, thiserror::Error)]
pub enum LocalError {
    // -----------------------------------------------------------------------
    // Access / session errors
    // -----------------------------------------------------------------------
    /// The serialized access grant could not be decoded.
    #[error("uplink: invalid access grant: {reason}")]
    InvalidAccess {
        /// What was wrong with it.
        reason: String,
    },

    /// The API key is unknown to the satellite.
    #[error("uplink: invalid API key")]
    InvalidApiKey,

    /// The satellite address is not reachable.
    #[error("uplink: dial {address}: satellite unreachable")]
    DialFailed {
        /// The address that was dialed.
        address: String,
    },

    /// A caveat, the validity window, or a revocation forbids the request.
    #[error("uplink: permission denied ({operation})")]
    PermissionDenied {
        /// The refused operation.
        operation: &'static str,
    },

    /// The project session was already closed.
    #[error("uplink: project closed")]
    ProjectClosed,

    /// The handle is unknown, freed, or of the wrong kind.
    #[error("uplink: invalid handle {handle:#x}")]
    InvalidHandle {
        /// The raw handle value.
        handle: usize,
    },

    /// A string crossing the boundary was not UTF-8.
    #[error("uplink: {argument} is not valid UTF-8")]
    InvalidString {
        /// The offending argument.
        argument: &'static str,
    },

    /// A request argument was rejected.
    #[error("uplink: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Limits
    // -----------------------------------------------------------------------
    /// The per-session request rate was exceeded.
    #[error("uplink: too many requests")]
    TooManyRequests,

    /// The project egress limit was exceeded.
    #[error("uplink: bandwidth limit exceeded")]
    BandwidthLimitExceeded,

    /// The project storage limit was exceeded.
    #[error("uplink: storage limit exceeded")]
    StorageLimitExceeded,

    /// The project segment limit was exceeded.
    #[error("uplink: segments limit exceeded")]
    SegmentsLimitExceeded,

    // -----------------------------------------------------------------------
    // Bucket errors
    // -----------------------------------------------------------------------
    /// The bucket name is not valid.
    #[error("uplink: bucket name invalid ({name:?}): {reason}")]
    BucketNameInvalid {
        /// The invalid name.
        name: String,
        /// Which rule it breaks.
        reason: String,
    },

    /// The bucket already exists.
    #[error("uplink: bucket already exists ({bucket:?})")]
    BucketAlreadyExists {
        /// The bucket name.
        bucket: String,
    },

    /// The bucket still holds objects.
    #[error("uplink: bucket not empty ({bucket:?})")]
    BucketNotEmpty {
        /// The bucket name.
        bucket: String,
    },

    /// The bucket does not exist.
    #[error("uplink: bucket not found ({bucket:?})")]
    BucketNotFound {
        /// The bucket name.
        bucket: String,
    },

    // -----------------------------------------------------------------------
    // Object / upload errors
    // -----------------------------------------------------------------------
    /// The object key is not valid.
    #[error("uplink: object key invalid ({key:?})")]
    ObjectKeyInvalid {
        /// The invalid key.
        key: String,
    },

    /// The object does not exist.
    #[error("uplink: object not found ({key:?})")]
    ObjectNotFound {
        /// The missing key.
        key: String,
    },

    /// The upload stream was already committed or aborted.
    #[error("uplink: upload done")]
    UploadDone,

    /// The download stream was already closed.
    #[error("uplink: download closed")]
    DownloadClosed,

    /// The requested range starts past the end of the object.
    #[error("uplink: offset {offset} is beyond object size {size}")]
    InvalidRange {
        /// Requested offset.
        offset: i64,
        /// Object size.
        size: u64,
    },

    /// The multipart upload does not exist or was already finalized.
    #[error("uplink: multipart upload not found ({upload_id:?})")]
    UploadNotFound {
        /// The upload identifier.
        upload_id: String,
    },

    /// A multipart upload was committed without any committed part.
    #[error("uplink: multipart upload has no committed parts")]
    NoParts,

    /// A non-final part is below the minimum part size.
    #[error("uplink: part {part_number} size {size} is below the minimum part size {min}")]
    PartTooSmall {
        /// The offending part.
        part_number: u32,
        /// Its size.
        size: u64,
        /// The minimum.
        min: u64,
    },

    // -----------------------------------------------------------------------
    // Edge errors
    // -----------------------------------------------------------------------
    /// The auth service could not be dialed.
    #[error("edge: dial {address}: auth service unreachable")]
    EdgeAuthDialFailed {
        /// The dialed address.
        address: String,
    },

    /// The auth service refused the access.
    #[error("edge: register access failed: {reason}")]
    EdgeRegisterAccessFailed {
        /// Why registration failed.
        reason: String,
    },

    // -----------------------------------------------------------------------
    // Internal / catch-all
    // -----------------------------------------------------------------------
    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LocalError {
    /// The numeric code reported across the boundary.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidHandle { .. } => codes::ERROR_INVALID_HANDLE,
            Self::TooManyRequests => codes::ERROR_TOO_MANY_REQUESTS,
            Self::BandwidthLimitExceeded => codes::ERROR_BANDWIDTH_LIMIT_EXCEEDED,
            Self::StorageLimitExceeded => codes::ERROR_STORAGE_LIMIT_EXCEEDED,
            Self::SegmentsLimitExceeded => codes::ERROR_SEGMENTS_LIMIT_EXCEEDED,
            Self::BucketNameInvalid { .. } => codes::ERROR_BUCKET_NAME_INVALID,
            Self::BucketAlreadyExists { .. } => codes::ERROR_BUCKET_ALREADY_EXISTS,
            Self::BucketNotEmpty { .. } => codes::ERROR_BUCKET_NOT_EMPTY,
            Self::BucketNotFound { .. } => codes::ERROR_BUCKET_NOT_FOUND,
            Self::ObjectKeyInvalid { .. } => codes::ERROR_OBJECT_KEY_INVALID,
            Self::ObjectNotFound { .. } => codes::ERROR_OBJECT_NOT_FOUND,
            Self::UploadDone => codes::ERROR_UPLOAD_DONE,
            Self::EdgeAuthDialFailed { .. } => codes::EDGE_ERROR_AUTH_DIAL_FAILED,
            Self::EdgeRegisterAccessFailed { .. } => codes::EDGE_ERROR_REGISTER_ACCESS_FAILED,
            Self::InvalidAccess { .. }
            | Self::InvalidApiKey
            | Self::DialFailed { .. }
            | Self::PermissionDenied { .. }
            | Self::ProjectClosed
            | Self::InvalidString { .. }
            | Self::InvalidRequest { .. }
            | Self::DownloadClosed
            | Self::InvalidRange { .. }
            | Self::UploadNotFound { .. }
            | Self::NoParts
            | Self::PartTooSmall { .. }
            | Self::Internal(_) => codes::ERROR_INTERNAL,
        }
    }

    /// Convert into the struct returned across the boundary.
    #[must_use]
    pub fn into_raw(self) -> RawError {
        let code = self.code();
        RawError {
            code,
            message: to_cstring(self.to_string()),
        }
    }

    /// Shorthand for [`LocalError::InvalidRequest`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

/// The reserved end-of-stream error.
#[must_use]
pub(crate) fn eof() -> RawError {
    RawError {
        code: codes::EOF,
        message: to_cstring("EOF".to_owned()),
    }
}

/// Build a C string, dropping interior NUL bytes.
pub(crate) fn to_cstring(value: String) -> CString {
    CString::new(value).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    })
}

/// Convenience result type for peer operations.
pub type LocalResult<T> = Result<T, LocalError>;
