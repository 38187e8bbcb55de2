//! Lazy listings over the library's pull iterators.
//!
//! A [`ListIter`] is forward-only and cannot be restarted. To resume a
//! listing, start a new one with the cursor option set to the last name,
//! key or part number seen.

use std::fmt;
use std::iter::FusedIterator;

use uplink_sys::{
    BucketIteration, ObjectIteration, PartIteration, PullIterator, RawBucket, RawObject, RawPart,
    RawUploadInfo, Release, UploadIteration,
};

use crate::bucket::Bucket;
use crate::error::{Error, Result};
use crate::multipart::{UploadInfo, UploadPart};
use crate::object::Object;
use crate::project::Project;

/// A pull iterator kind whose raw elements convert to a binding value.
pub trait Listing: PullIterator {
    /// The element yielded to callers.
    type Value: Clone + fmt::Debug;

    /// Copy an element out of foreign memory.
    fn value(raw: &Self::Item) -> Self::Value;
}

impl Listing for BucketIteration {
    type Value = Bucket;

    fn value(raw: &RawBucket) -> Bucket {
        Bucket::from_raw(raw)
    }
}

impl Listing for ObjectIteration {
    type Value = Object;

    fn value(raw: &RawObject) -> Object {
        Object::from_raw(raw)
    }
}

impl Listing for UploadIteration {
    type Value = UploadInfo;

    fn value(raw: &RawUploadInfo) -> UploadInfo {
        UploadInfo::from_raw(raw)
    }
}

impl Listing for PartIteration {
    type Value = UploadPart;

    fn value(raw: &RawPart) -> UploadPart {
        UploadPart::from_raw(raw)
    }
}

/// A listing in progress.
///
/// Drive it either with [`advance`](Self::advance), [`item`](Self::item)
/// and [`err`](Self::err), or as an [`Iterator`] of results that ends
/// with at most one `Err`. The foreign iterator is released on drop.
pub struct ListIter<'p, K: Listing> {
    source: Option<(&'p Project, K::Handle)>,
    current: Option<K::Value>,
    failure: Option<Error>,
    exhausted: bool,
    reported: bool,
}

impl<'p, K: Listing> ListIter<'p, K> {
    pub(crate) fn new(project: &'p Project, handle: K::Handle) -> Self {
        Self {
            source: Some((project, handle)),
            current: None,
            failure: None,
            exhausted: false,
            reported: false,
        }
    }

    /// A listing that never reached the library.
    pub(crate) fn failed(error: Error) -> Self {
        Self {
            source: None,
            current: None,
            failure: Some(error),
            exhausted: true,
            reported: false,
        }
    }

    /// Move to the next element.
    ///
    /// `false` means the listing is over. Check [`err`](Self::err) to tell
    /// a clean end from a failure.
    pub fn advance(&mut self) -> bool {
        self.current = None;
        if self.exhausted {
            return false;
        }
        let Some((project, handle)) = self.source else {
            self.exhausted = true;
            return false;
        };
        let boundary = project.boundary();

        if !K::next(boundary, handle) {
            self.exhausted = true;
            if let Some(raw) = K::err(boundary, handle) {
                self.failure = Some(Error::from_raw(&raw));
                raw.release(boundary);
            }
            return false;
        }

        if let Some(raw) = K::item(boundary, handle) {
            self.current = Some(K::value(&raw));
            raw.release(boundary);
            true
        } else {
            self.exhausted = true;
            self.failure = Some(Error::internal(
                "uplink: iterator advanced without an item",
            ));
            false
        }
    }

    /// The element the last successful [`advance`](Self::advance) moved
    /// to.
    #[must_use]
    pub fn item(&self) -> Option<K::Value> {
        self.current.clone()
    }

    /// Why the listing stopped, if it failed.
    #[must_use]
    pub fn err(&self) -> Option<Error> {
        self.failure.clone()
    }
}

impl<K: Listing> Iterator for ListIter<'_, K> {
    type Item = Result<K::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            return self.current.clone().map(Ok);
        }
        if self.reported {
            return None;
        }
        self.reported = true;
        self.failure.clone().map(Err)
    }
}

impl<K: Listing> FusedIterator for ListIter<'_, K> {}

impl<K: Listing> Drop for ListIter<'_, K> {
    fn drop(&mut self) {
        if let Some((project, handle)) = self.source.take() {
            handle.release(project.boundary());
        }
    }
}

impl<K: Listing> fmt::Debug for ListIter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListIter")
            .field("handle", &self.source.as_ref().map(|(_, handle)| handle))
            .field("current", &self.current)
            .field("failure", &self.failure)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
