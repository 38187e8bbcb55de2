//! One shape for the four pull-style iterator families.

use crate::Boundary;
use crate::handle::{
    BucketIteratorHandle, ObjectIteratorHandle, PartIteratorHandle, UploadIteratorHandle,
};
use crate::result::Release;
use crate::types::{RawBucket, RawError, RawObject, RawPart, RawUploadInfo};

/// `next`/`item`/`err`/`free` over one iterator handle kind.
pub trait PullIterator {
    /// The iterator handle.
    type Handle: Copy + Release + std::fmt::Debug;
    /// The raw element.
    type Item: Release;

    /// Advance; `false` means exhausted or failed.
    fn next(boundary: &dyn Boundary, handle: Self::Handle) -> bool;
    /// The current element.
    fn item(boundary: &dyn Boundary, handle: Self::Handle) -> Option<Self::Item>;
    /// The terminal error, if the listing stopped on one.
    fn err(boundary: &dyn Boundary, handle: Self::Handle) -> Option<RawError>;
}

macro_rules! define_pull_iterator {
    ($(#[$meta:meta])* $kind:ident, $handle:ty, $item:ty, $next:ident, $get:ident, $err:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub enum $kind {}

        impl PullIterator for $kind {
            type Handle = $handle;
            type Item = $item;

            fn next(boundary: &dyn Boundary, handle: Self::Handle) -> bool {
                boundary.$next(handle)
            }

            fn item(boundary: &dyn Boundary, handle: Self::Handle) -> Option<Self::Item> {
                boundary.$get(handle)
            }

            fn err(boundary: &dyn Boundary, handle: Self::Handle) -> Option<RawError> {
                boundary.$err(handle)
            }
        }
    };
}

define_pull_iterator!(
    /// Bucket listings.
    BucketIteration,
    BucketIteratorHandle,
    RawBucket,
    bucket_iterator_next,
    bucket_iterator_item,
    bucket_iterator_err
);
define_pull_iterator!(
    /// Object listings.
    ObjectIteration,
    ObjectIteratorHandle,
    RawObject,
    object_iterator_next,
    object_iterator_item,
    object_iterator_err
);
define_pull_iterator!(
    /// Pending multipart upload listings.
    UploadIteration,
    UploadIteratorHandle,
    RawUploadInfo,
    upload_iterator_next,
    upload_iterator_item,
    upload_iterator_err
);
define_pull_iterator!(
    /// Committed part listings.
    PartIteration,
    PartIteratorHandle,
    RawPart,
    part_iterator_next,
    part_iterator_item,
    part_iterator_err
);
