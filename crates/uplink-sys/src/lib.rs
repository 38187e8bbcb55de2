//! Contract of the native uplink storage library.
//!
//! The library is a black box reached through a C-style ABI: opaque
//! handles, paired `{value, error}` result structs, NUL-terminated
//! strings, and pull-style iterators. This crate describes that ABI as
//! Rust types and a [`Boundary`] trait. It does no work itself; a safe
//! binding sits on top and an implementation (the native library or an
//! in-process peer) sits underneath.
//!
//! ```text
//!   safe binding  ──calls──▶  dyn Boundary  ──▶  native library / peer
//!        ▲                         │
//!        └──── RawResult<T> ◀──────┘  (freed via Release)
//! ```

pub mod boundary;
pub mod codes;
pub mod handle;
pub mod iter;
pub mod result;
pub mod types;

pub use boundary::Boundary;
pub use handle::{
    AccessHandle, BucketIteratorHandle, DownloadHandle, EncryptionKeyHandle,
    ObjectIteratorHandle, PartIteratorHandle, PartUploadHandle, ProjectHandle, UploadHandle,
    UploadIteratorHandle,
};
pub use iter::{BucketIteration, ObjectIteration, PartIteration, PullIterator, UploadIteration};
pub use result::{
    AccessResult, BucketResult, DownloadResult, EdgeCredentialsResult, EncryptionKeyResult,
    ObjectResult, PartResult, PartUploadResult, ProjectResult, RawResult, ReadResult, Release,
    StringResult, UploadInfoResult, UploadResult, WriteResult,
};
pub use types::{
    RawBucket, RawCommitUploadOptions, RawConfig, RawCustomMetadata, RawCustomMetadataEntry,
    RawDownloadOptions, RawEdgeConfig, RawEdgeCredentials, RawEdgeRegisterAccessOptions,
    RawError, RawListBucketsOptions, RawListObjectsOptions, RawListUploadPartsOptions,
    RawListUploadsOptions, RawObject, RawPart, RawPermission, RawShareUrlOptions,
    RawSharePrefix, RawSystemMetadata, RawUploadInfo, RawUploadOptions,
};
