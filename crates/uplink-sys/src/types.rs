//! C-shaped value and option structs exchanged with the native library.
//!
//! Strings are NUL-terminated ([`CString`]); timestamps are unix seconds
//! where `0` means "not set". Optional strings are `None` where the ABI
//! would pass a null pointer.

use std::ffi::CString;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// The value returned by an error-carrying call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawError {
    /// One of the codes in [`crate::codes`], or an unknown value.
    pub code: i32,
    /// Human readable message supplied by the library.
    pub message: CString,
}

/// A bucket record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBucket {
    /// Bucket name.
    pub name: CString,
    /// Creation time, unix seconds.
    pub created: i64,
}

/// System metadata attached to an object or pending upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSystemMetadata {
    /// Creation time, unix seconds.
    pub created: i64,
    /// Expiration time, unix seconds.
    pub expires: i64,
    /// Content length in bytes.
    pub content_length: i64,
}

/// One custom metadata entry. Lengths exclude any terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCustomMetadataEntry {
    /// Key bytes.
    pub key: Box<[u8]>,
    /// Number of valid bytes in `key`.
    pub key_length: usize,
    /// Value bytes.
    pub value: Box<[u8]>,
    /// Number of valid bytes in `value`.
    pub value_length: usize,
}

impl RawCustomMetadataEntry {
    /// Build an entry whose lengths match its buffers.
    #[must_use]
    pub fn new(key: &[u8], value: &[u8]) -> Self {
        Self {
            key: key.into(),
            key_length: key.len(),
            value: value.into(),
            value_length: value.len(),
        }
    }

    /// The valid key bytes.
    #[must_use]
    pub fn key_bytes(&self) -> &[u8] {
        &self.key[..self.key_length.min(self.key.len())]
    }

    /// The valid value bytes.
    #[must_use]
    pub fn value_bytes(&self) -> &[u8] {
        &self.value[..self.value_length.min(self.value.len())]
    }
}

/// A custom metadata array. An empty set is `count == 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCustomMetadata {
    /// Entry storage.
    pub entries: Vec<RawCustomMetadataEntry>,
    /// Number of valid entries.
    pub count: usize,
}

impl RawCustomMetadata {
    /// Build a metadata array whose count matches its entries.
    #[must_use]
    pub fn from_entries(entries: Vec<RawCustomMetadataEntry>) -> Self {
        let count = entries.len();
        Self { entries, count }
    }

    /// The valid entries.
    pub fn iter(&self) -> impl Iterator<Item = &RawCustomMetadataEntry> {
        self.entries.iter().take(self.count)
    }
}

/// An object record, or a prefix pseudo-entry when listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    /// Object key.
    pub key: CString,
    /// Whether this entry is a synthetic prefix.
    pub is_prefix: bool,
    /// System metadata.
    pub system: RawSystemMetadata,
    /// Custom metadata.
    pub custom: RawCustomMetadata,
}

/// A pending multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUploadInfo {
    /// Upload identifier.
    pub upload_id: CString,
    /// Object key.
    pub key: CString,
    /// Whether this entry is a synthetic prefix.
    pub is_prefix: bool,
    /// System metadata.
    pub system: RawSystemMetadata,
    /// Custom metadata.
    pub custom: RawCustomMetadata,
}

/// A part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPart {
    /// 1-based part number.
    pub part_number: u32,
    /// Size in bytes.
    pub size: usize,
    /// Last modification time, unix seconds.
    pub modified: i64,
    /// Entity tag.
    pub etag: CString,
}

/// Gateway credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdgeCredentials {
    /// Access key id.
    pub access_key_id: CString,
    /// Secret key.
    pub secret_key: CString,
    /// Gateway endpoint URL.
    pub endpoint: CString,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfig {
    /// User agent reported to the satellite.
    pub user_agent: Option<CString>,
    /// Dial timeout; `0` selects the library default.
    pub dial_timeout_milliseconds: i32,
    /// Directory for temporary buffers.
    pub temp_directory: Option<CString>,
}

/// Capabilities granted to a shared access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawPermission {
    /// Allow downloads.
    pub allow_download: bool,
    /// Allow uploads.
    pub allow_upload: bool,
    /// Allow listing.
    pub allow_list: bool,
    /// Allow deletes.
    pub allow_delete: bool,
    /// Not valid before this time, unix seconds; `0` is unbounded.
    pub not_before: i64,
    /// Not valid after this time, unix seconds; `0` is unbounded.
    pub not_after: i64,
}

/// A bucket and optional key-prefix restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSharePrefix {
    /// Bucket name.
    pub bucket: CString,
    /// Key prefix; `None` grants the whole bucket.
    pub prefix: Option<CString>,
}

/// Upload options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawUploadOptions {
    /// Expiration time, unix seconds; `0` never expires.
    pub expires: i64,
}

/// Download range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDownloadOptions {
    /// First byte to return.
    pub offset: i64,
    /// Number of bytes; negative reads to the end.
    pub length: i64,
}

impl Default for RawDownloadOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            length: -1,
        }
    }
}

/// Bucket listing options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListBucketsOptions {
    /// Resume strictly after this bucket name.
    pub cursor: Option<CString>,
}

/// Object listing options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListObjectsOptions {
    /// Only keys starting with this prefix.
    pub prefix: Option<CString>,
    /// Resume strictly after this key.
    pub cursor: Option<CString>,
    /// Flat listing instead of directory-style grouping.
    pub recursive: bool,
    /// Include system metadata.
    pub system: bool,
    /// Include custom metadata.
    pub custom: bool,
}

/// Pending upload listing options. Same shape as object listing.
pub type RawListUploadsOptions = RawListObjectsOptions;

/// Part listing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawListUploadPartsOptions {
    /// Resume strictly after this part number.
    pub cursor: u32,
}

/// Multipart commit options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCommitUploadOptions {
    /// Custom metadata of the assembled object.
    pub custom_metadata: RawCustomMetadata,
}

/// Edge auth service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdgeConfig {
    /// Auth service `host:port`.
    pub auth_service_address: CString,
    /// PEM certificate to trust instead of the system roots.
    pub certificate_pem: Option<CString>,
    /// Dial without TLS.
    pub insecure_unencrypted_connection: bool,
}

/// Edge registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawEdgeRegisterAccessOptions {
    /// Allow unauthenticated reads through the gateway.
    pub is_public: bool,
}

/// Share URL options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawShareUrlOptions {
    /// Direct content link instead of a landing page.
    pub raw: bool,
}
