//! Pending multipart uploads.
//!
//! A [`PendingUpload`] is created by `begin_upload` and collects
//! [`StoredPart`] entries as part streams commit. Nothing is visible as an
//! object until [`PendingUpload::assemble`] succeeds at `commit_upload`.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use uplink_sys::{RawCustomMetadata, RawPart, RawSystemMetadata, RawUploadInfo};

use crate::convert::cstring;
use crate::error::{LocalError, LocalResult};
use crate::grant::random_hex;

/// Generate a random upload id: 32 bytes, hex encoded.
#[must_use]
pub fn generate_upload_id() -> String {
    random_hex::<32>()
}

/// An in-progress multipart upload.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    /// Unique identifier of this upload.
    pub upload_id: String,
    /// The object key that this upload will create.
    pub key: String,
    /// When the upload was started, unix seconds.
    pub created: i64,
    /// Expiration of the final object, unix seconds.
    pub expires: i64,
    /// Committed parts keyed by part number.
    pub parts: BTreeMap<u32, StoredPart>,
}

impl PendingUpload {
    /// Start a new upload for `key`.
    #[must_use]
    pub fn new(key: String, created: i64, expires: i64) -> Self {
        Self {
            upload_id: generate_upload_id(),
            key,
            created,
            expires,
            parts: BTreeMap::new(),
        }
    }

    /// Insert or replace a part.
    pub fn put_part(&mut self, part: StoredPart) {
        self.parts.insert(part.part_number, part);
    }

    /// Total size of committed parts.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.parts.values().map(StoredPart::size).sum()
    }

    /// Concatenate the committed parts in part-number order.
    ///
    /// Every part except the highest-numbered one must be at least
    /// `min_part_size` bytes.
    pub fn assemble(&self, min_part_size: u64) -> LocalResult<Bytes> {
        let Some(last) = self.parts.keys().next_back().copied() else {
            return Err(LocalError::NoParts);
        };

        for part in self.parts.values() {
            if part.part_number != last && part.size() < min_part_size {
                return Err(LocalError::PartTooSmall {
                    part_number: part.part_number,
                    size: part.size(),
                    min: min_part_size,
                });
            }
        }

        let mut data = BytesMut::with_capacity(usize::try_from(self.total_size()).unwrap_or(0));
        for part in self.parts.values() {
            data.extend_from_slice(&part.data);
        }
        Ok(data.freeze())
    }

    /// Boundary record for listings and `begin_upload`.
    #[must_use]
    pub fn to_raw(&self, system: bool) -> RawUploadInfo {
        RawUploadInfo {
            upload_id: cstring(&self.upload_id),
            key: cstring(&self.key),
            is_prefix: false,
            system: if system {
                RawSystemMetadata {
                    created: self.created,
                    expires: self.expires,
                    content_length: 0,
                }
            } else {
                RawSystemMetadata::default()
            },
            custom: RawCustomMetadata::default(),
        }
    }
}

/// A synthetic prefix entry for directory-style pending upload listings.
#[must_use]
pub fn prefix_upload(prefix: &str) -> RawUploadInfo {
    RawUploadInfo {
        upload_id: cstring(""),
        key: cstring(prefix),
        is_prefix: true,
        system: RawSystemMetadata::default(),
        custom: RawCustomMetadata::default(),
    }
}

/// A committed part.
#[derive(Debug, Clone)]
pub struct StoredPart {
    /// 1-based part number.
    pub part_number: u32,
    /// Content.
    pub data: Bytes,
    /// Client-assigned entity tag.
    pub etag: String,
    /// Commit time, unix seconds.
    pub modified: i64,
}

impl StoredPart {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Boundary record.
    #[must_use]
    pub fn to_raw(&self) -> RawPart {
        RawPart {
            part_number: self.part_number,
            size: self.data.len(),
            modified: self.modified,
            etag: cstring(&self.etag),
        }
    }
}
