//! Error types of the binding.
//!
//! Every failure reported by the native library becomes
//! [`Error::Service`]: the numeric code, its [`ErrorKind`] from the fixed
//! code table, and the library's message unchanged. Problems caught
//! before a call is made (such as a string with an interior NUL byte) are
//! [`Error::InvalidArgument`] and never reach the library.

use uplink_sys::{RawError, codes};

/// Result alias used throughout the binding.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classification of a library error code.
///
/// Codes the table does not know map to [`ErrorKind::Internal`], so a
/// match over this enum never needs a wildcard for unknown codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Internal error, also used for unmapped codes.
    Internal,
    /// The operation was canceled.
    Canceled,
    /// A handle was invalid.
    InvalidHandle,
    /// The request was rate limited; retrying is expected to succeed.
    TooManyRequests,
    /// The project bandwidth limit was exceeded.
    BandwidthLimitExceeded,
    /// The project storage limit was exceeded.
    StorageLimitExceeded,
    /// The project segment limit was exceeded.
    SegmentsLimitExceeded,
    /// The bucket name is invalid.
    BucketNameInvalid,
    /// The bucket already exists.
    BucketAlreadyExists,
    /// The bucket is not empty.
    BucketNotEmpty,
    /// The bucket does not exist.
    BucketNotFound,
    /// The object key is invalid.
    ObjectKeyInvalid,
    /// The object does not exist.
    ObjectNotFound,
    /// The upload was already committed or aborted.
    UploadDone,
    /// The edge auth service could not be reached.
    EdgeAuthDialFailed,
    /// The edge auth service refused the access.
    EdgeRegisterAccessFailed,
}

impl ErrorKind {
    /// Look up a library error code.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::ERROR_CANCELED => Self::Canceled,
            codes::ERROR_INVALID_HANDLE => Self::InvalidHandle,
            codes::ERROR_TOO_MANY_REQUESTS => Self::TooManyRequests,
            codes::ERROR_BANDWIDTH_LIMIT_EXCEEDED => Self::BandwidthLimitExceeded,
            codes::ERROR_STORAGE_LIMIT_EXCEEDED => Self::StorageLimitExceeded,
            codes::ERROR_SEGMENTS_LIMIT_EXCEEDED => Self::SegmentsLimitExceeded,
            codes::ERROR_BUCKET_NAME_INVALID => Self::BucketNameInvalid,
            codes::ERROR_BUCKET_ALREADY_EXISTS => Self::BucketAlreadyExists,
            codes::ERROR_BUCKET_NOT_EMPTY => Self::BucketNotEmpty,
            codes::ERROR_BUCKET_NOT_FOUND => Self::BucketNotFound,
            codes::ERROR_OBJECT_KEY_INVALID => Self::ObjectKeyInvalid,
            codes::ERROR_OBJECT_NOT_FOUND => Self::ObjectNotFound,
            codes::ERROR_UPLOAD_DONE => Self::UploadDone,
            codes::EDGE_ERROR_AUTH_DIAL_FAILED => Self::EdgeAuthDialFailed,
            codes::EDGE_ERROR_REGISTER_ACCESS_FAILED => Self::EdgeRegisterAccessFailed,
            _ => Self::Internal,
        }
    }

    /// The canonical code of this kind.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Internal => codes::ERROR_INTERNAL,
            Self::Canceled => codes::ERROR_CANCELED,
            Self::InvalidHandle => codes::ERROR_INVALID_HANDLE,
            Self::TooManyRequests => codes::ERROR_TOO_MANY_REQUESTS,
            Self::BandwidthLimitExceeded => codes::ERROR_BANDWIDTH_LIMIT_EXCEEDED,
            Self::StorageLimitExceeded => codes::ERROR_STORAGE_LIMIT_EXCEEDED,
            Self::SegmentsLimitExceeded => codes::ERROR_SEGMENTS_LIMIT_EXCEEDED,
            Self::BucketNameInvalid => codes::ERROR_BUCKET_NAME_INVALID,
            Self::BucketAlreadyExists => codes::ERROR_BUCKET_ALREADY_EXISTS,
            Self::BucketNotEmpty => codes::ERROR_BUCKET_NOT_EMPTY,
            Self::BucketNotFound => codes::ERROR_BUCKET_NOT_FOUND,
            Self::ObjectKeyInvalid => codes::ERROR_OBJECT_KEY_INVALID,
            Self::ObjectNotFound => codes::ERROR_OBJECT_NOT_FOUND,
            Self::UploadDone => codes::ERROR_UPLOAD_DONE,
            Self::EdgeAuthDialFailed => codes::EDGE_ERROR_AUTH_DIAL_FAILED,
            Self::EdgeRegisterAccessFailed => codes::EDGE_ERROR_REGISTER_ACCESS_FAILED,
        }
    }
}

/// Binding error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The library reported a failure.
    #[error("{message}")]
    Service {
        /// Classification of `code`.
        kind: ErrorKind,
        /// The code exactly as reported.
        code: i32,
        /// The library's message.
        message: String,
    },

    /// An argument was rejected before calling the library.
    #[error("invalid argument {argument}: {reason}")]
    InvalidArgument {
        /// The offending argument.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl Error {
    /// Copy a library error out of foreign memory.
    #[must_use]
    pub fn from_raw(raw: &RawError) -> Self {
        Self::Service {
            kind: ErrorKind::from_code(raw.code),
            code: raw.code,
            message: raw.message.to_string_lossy().into_owned(),
        }
    }

    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// An internal failure detected by the binding itself, such as a
    /// result carrying neither a value nor an error.
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Service {
            kind: ErrorKind::Internal,
            code: codes::ERROR_INTERNAL,
            message: message.into(),
        }
    }

    /// The kind of a library error; `None` for argument errors.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Service { kind, .. } => Some(*kind),
            Self::InvalidArgument { .. } => None,
        }
    }

    /// The code of a library error; `None` for argument errors.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Service { code, .. } => Some(*code),
            Self::InvalidArgument { .. } => None,
        }
    }

    /// Whether the caller is expected to retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == Some(ErrorKind::TooManyRequests)
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidArgument { .. } => Self::new(std::io::ErrorKind::InvalidInput, e),
            Error::Service { .. } => Self::other(e),
        }
    }
}
