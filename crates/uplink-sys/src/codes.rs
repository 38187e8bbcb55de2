//! Numeric error codes reported in [`RawError`](crate::RawError).

/// End of a download stream. Not a failure.
pub const EOF: i32 = -1;

/// Unclassified failure; also the fallback for unknown codes.
pub const ERROR_INTERNAL: i32 = 0x02;
/// The operation was canceled.
pub const ERROR_CANCELED: i32 = 0x03;
/// A handle was invalid, freed, or of the wrong kind.
pub const ERROR_INVALID_HANDLE: i32 = 0x04;
/// The service is rate limiting this client.
pub const ERROR_TOO_MANY_REQUESTS: i32 = 0x05;
/// The project's bandwidth limit is exhausted.
pub const ERROR_BANDWIDTH_LIMIT_EXCEEDED: i32 = 0x06;
/// The project's storage limit is exhausted.
pub const ERROR_STORAGE_LIMIT_EXCEEDED: i32 = 0x07;
/// The project's segment limit is exhausted.
pub const ERROR_SEGMENTS_LIMIT_EXCEEDED: i32 = 0x08;

/// The bucket name is not valid.
pub const ERROR_BUCKET_NAME_INVALID: i32 = 0x10;
/// A bucket with this name already exists.
pub const ERROR_BUCKET_ALREADY_EXISTS: i32 = 0x11;
/// The bucket still holds objects.
pub const ERROR_BUCKET_NOT_EMPTY: i32 = 0x12;
/// No bucket with this name exists.
pub const ERROR_BUCKET_NOT_FOUND: i32 = 0x13;

/// The object key is not valid.
pub const ERROR_OBJECT_KEY_INVALID: i32 = 0x20;
/// No object with this key exists.
pub const ERROR_OBJECT_NOT_FOUND: i32 = 0x21;
/// The upload was already committed or aborted.
pub const ERROR_UPLOAD_DONE: i32 = 0x22;

/// The edge auth service could not be reached.
pub const EDGE_ERROR_AUTH_DIAL_FAILED: i32 = 0x30;
/// The edge auth service refused to register the access.
pub const EDGE_ERROR_REGISTER_ACCESS_FAILED: i32 = 0x31;
