//! Opaque handles to foreign resources.
//!
//! A handle is a pointer-sized integer issued by the native library. It is
//! never dereferenced on this side of the boundary; it is only passed back
//! into boundary calls. Each resource kind gets its own newtype so a
//! project handle cannot be handed to a call that expects an upload.

use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Wrap a raw handle value issued by the native library.
            #[must_use]
            pub const fn from_raw(raw: usize) -> Self {
                Self(raw)
            }

            /// The raw handle value.
            #[must_use]
            pub const fn as_raw(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

define_handle!(
    /// Handle to a parsed or derived access grant.
    AccessHandle
);
define_handle!(
    /// Handle to an open project session.
    ProjectHandle
);
define_handle!(
    /// Handle to an object upload stream.
    UploadHandle
);
define_handle!(
    /// Handle to an object download stream.
    DownloadHandle
);
define_handle!(
    /// Handle to a single part of a multipart upload.
    PartUploadHandle
);
define_handle!(
    /// Handle to a derived encryption key.
    EncryptionKeyHandle
);
define_handle!(
    /// Handle to a bucket listing cursor.
    BucketIteratorHandle
);
define_handle!(
    /// Handle to an object listing cursor.
    ObjectIteratorHandle
);
define_handle!(
    /// Handle to a pending multipart upload listing cursor.
    UploadIteratorHandle
);
define_handle!(
    /// Handle to a committed part listing cursor.
    PartIteratorHandle
);
