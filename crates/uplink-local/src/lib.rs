//! An in-process uplink peer.
//!
//! [`LocalUplink`] implements the [`uplink_sys::Boundary`] contract against
//! an in-memory satellite, so the safe binding can be exercised without a
//! network or a native library. It keeps the same observable behaviour:
//! paired results, the error code table, handle kinds, chunked stream
//! transfers, lazily evaluated listings, and grant caveats.
//!
//! # Architecture
//!
//! ```text
//! Boundary trait impl (provider)
//!        |
//!        v
//!   ops handlers (access, bucket, object, multipart, list, edge)
//!        |
//!        v
//!   Universe (live handles) + Session (authorized project view)
//!        |
//!        v
//!   Satellite -> ProjectState -> Bucket -> StoredObject / PendingUpload
//! ```

pub mod config;
mod convert;
mod cursor;
pub mod error;
mod grant;
mod ops;
pub mod provider;
mod session;
pub(crate) mod state;
mod stream;
mod universe;
pub mod validation;

pub use config::LocalConfig;
pub use error::{LocalError, LocalResult};
pub use provider::LocalUplink;
