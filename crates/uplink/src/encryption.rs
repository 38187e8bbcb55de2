//! Derived encryption keys.

use uplink_sys::{EncryptionKeyHandle, EncryptionKeyResult};

use crate::error::Result;
use crate::guard::{self, Scoped, SharedBoundary};

/// A key derived with [`Uplink::derive_encryption_key`], used to override
/// the encryption of a bucket prefix.
///
/// [`Uplink::derive_encryption_key`]: crate::Uplink::derive_encryption_key
#[derive(Debug)]
pub struct EncryptionKey {
    handle: EncryptionKeyHandle,
    _raw: Scoped<EncryptionKeyResult>,
}

impl EncryptionKey {
    pub(crate) fn from_result(
        boundary: &SharedBoundary,
        result: EncryptionKeyResult,
    ) -> Result<Self> {
        let (handle, raw) = guard::owned(boundary, result, "derive_encryption_key")?;
        Ok(Self { handle, _raw: raw })
    }

    pub(crate) fn handle(&self) -> EncryptionKeyHandle {
        self.handle
    }
}
