//! Safe binding over the native uplink storage library.
//!
//! Every foreign resource is an owned Rust value: dropping it releases the
//! memory the library handed out, on success and error paths alike.
//! Streams and listings borrow the [`Project`] they came from, so a
//! project cannot be closed while they are alive.
//!
//! ```text
//! Uplink ──parse / request──▶ Access ──open_project──▶ Project
//!                               │                        ├── Upload, Download
//!                               └── share ──▶ Access     ├── PartUpload
//!                                                        └── ListIter
//! ```
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use uplink::Uplink;
//! use uplink_local::{LocalConfig, LocalUplink};
//!
//! # fn main() -> uplink::Result<()> {
//! let config = LocalConfig::default();
//! let uplink = Uplink::new(Arc::new(LocalUplink::new(config.clone())));
//! let access = uplink.request_access_with_passphrase(
//!     &config.satellite_address,
//!     &config.api_keys[0],
//!     "correct horse battery staple",
//! )?;
//!
//! access.with_project(|project| {
//!     project.ensure_bucket("notes")?;
//!     project.with_upload("notes", "hello.txt", None, |upload| {
//!         upload.write_all(b"hello world")?;
//!         upload.commit()
//!     })?;
//!     let object = project.stat_object("notes", "hello.txt")?;
//!     assert_eq!(object.system.content_length, 11);
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

mod access;
mod bucket;
mod client;
pub mod config;
mod download;
mod edge;
mod encryption;
pub mod error;
mod guard;
mod iterator;
mod marshal;
pub mod metadata;
mod multipart;
mod object;
mod project;
mod upload;

pub use access::{Access, Permission, SharePrefix};
pub use bucket::{Bucket, BucketIterator, ListBucketsOptions};
pub use client::Uplink;
pub use config::Config;
pub use download::{Download, DownloadOptions, ReadOutcome};
pub use edge::{EdgeConfig, EdgeCredential, RegisterAccessOptions, ShareUrlOptions};
pub use encryption::EncryptionKey;
pub use error::{Error, ErrorKind, Result};
pub use iterator::{ListIter, Listing};
pub use metadata::{CustomMetadata, SystemMetadata};
pub use multipart::{
    CommitUploadOptions, ListUploadPartsOptions, ListUploadsOptions, PartIterator, PartUpload,
    UploadInfo, UploadIterator, UploadPart,
};
pub use object::{ListObjectsOptions, Object, ObjectIterator};
pub use project::Project;
pub use upload::{Upload, UploadOptions};
