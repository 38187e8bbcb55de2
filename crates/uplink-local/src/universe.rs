//! The table of live handles.
//!
//! Every resource handed across the boundary lives here under a fresh
//! non-zero id. Lookups check the resource kind, so a freed handle or one
//! of the wrong kind is reported as [`LocalError::InvalidHandle`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use uplink_sys::{
    AccessHandle, BucketIteratorHandle, DownloadHandle, EncryptionKeyHandle,
    ObjectIteratorHandle, PartIteratorHandle, PartUploadHandle, ProjectHandle, RawBucket,
    RawObject, RawPart, RawUploadInfo, UploadHandle, UploadIteratorHandle,
};

use crate::cursor::Cursor;
use crate::error::{LocalError, LocalResult};
use crate::grant::Grant;
use crate::session::Session;
use crate::stream::{DownloadStream, PartStream, UploadStream};

pub(crate) type Shared<T> = Arc<Mutex<T>>;

#[derive(Debug)]
enum Entry {
    Access(Arc<RwLock<Grant>>),
    EncryptionKey(Arc<String>),
    Project(Arc<Session>),
    Upload(Shared<UploadStream>),
    Download(Shared<DownloadStream>),
    PartUpload(Shared<PartStream>),
    BucketIterator(Shared<Cursor<RawBucket>>),
    ObjectIterator(Shared<Cursor<RawObject>>),
    UploadIterator(Shared<Cursor<RawUploadInfo>>),
    PartIterator(Shared<Cursor<RawPart>>),
}

#[derive(Debug)]
pub(crate) struct Universe {
    next: AtomicUsize,
    entries: DashMap<usize, Entry>,
}

macro_rules! handle_kind {
    ($variant:ident, $handle:ty, $value:ty, $insert:ident, $get:ident, $remove:ident) => {
        pub(crate) fn $insert(&self, value: $value) -> $handle {
            <$handle>::from_raw(self.insert(Entry::$variant(value)))
        }

        pub(crate) fn $get(&self, handle: $handle) -> LocalResult<$value> {
            match self.entries.get(&handle.as_raw()).as_deref() {
                Some(Entry::$variant(value)) => Ok(Arc::clone(value)),
                _ => Err(LocalError::InvalidHandle {
                    handle: handle.as_raw(),
                }),
            }
        }

        pub(crate) fn $remove(&self, handle: $handle) -> Option<$value> {
            let (_, entry) = self
                .entries
                .remove_if(&handle.as_raw(), |_, entry| matches!(entry, Entry::$variant(_)))?;
            match entry {
                Entry::$variant(value) => Some(value),
                _ => None,
            }
        }
    };
}

impl Universe {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicUsize::new(1),
            entries: DashMap::new(),
        }
    }

    fn insert(&self, entry: Entry) -> usize {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(id, entry);
        id
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    handle_kind!(Access, AccessHandle, Arc<RwLock<Grant>>, insert_access, access, remove_access);
    handle_kind!(
        EncryptionKey,
        EncryptionKeyHandle,
        Arc<String>,
        insert_encryption_key,
        encryption_key,
        remove_encryption_key
    );
    handle_kind!(Project, ProjectHandle, Arc<Session>, insert_project, project, remove_project);
    handle_kind!(Upload, UploadHandle, Shared<UploadStream>, insert_upload, upload, remove_upload);
    handle_kind!(
        Download,
        DownloadHandle,
        Shared<DownloadStream>,
        insert_download,
        download,
        remove_download
    );
    handle_kind!(
        PartUpload,
        PartUploadHandle,
        Shared<PartStream>,
        insert_part_upload,
        part_upload,
        remove_part_upload
    );
    handle_kind!(
        BucketIterator,
        BucketIteratorHandle,
        Shared<Cursor<RawBucket>>,
        insert_bucket_iterator,
        bucket_iterator,
        remove_bucket_iterator
    );
    handle_kind!(
        ObjectIterator,
        ObjectIteratorHandle,
        Shared<Cursor<RawObject>>,
        insert_object_iterator,
        object_iterator,
        remove_object_iterator
    );
    handle_kind!(
        UploadIterator,
        UploadIteratorHandle,
        Shared<Cursor<RawUploadInfo>>,
        insert_upload_iterator,
        upload_iterator,
        remove_upload_iterator
    );
    handle_kind!(
        PartIterator,
        PartIteratorHandle,
        Shared<Cursor<RawPart>>,
        insert_part_iterator,
        part_iterator,
        remove_part_iterator
    );
}
