//! Scoped ownership of foreign results.
//!
//! Every struct the library returns must be handed back exactly once.
//! [`Scoped`] holds one such struct and releases it on drop; the decode
//! helpers turn the `{value, error}` pair into a [`Result`], releasing the
//! foreign memory on both branches.

use std::fmt;
use std::sync::Arc;

use uplink_sys::{Boundary, RawError, RawResult, Release, WriteResult, codes};

use crate::error::{Error, Result};

/// The shared library handle every resource keeps alive.
pub(crate) type SharedBoundary = Arc<dyn Boundary>;

/// A foreign struct released when dropped.
pub(crate) struct Scoped<R: Release> {
    boundary: SharedBoundary,
    raw: Option<R>,
}

impl<R: Release> Scoped<R> {
    pub(crate) fn new(boundary: &SharedBoundary, raw: R) -> Self {
        Self {
            boundary: Arc::clone(boundary),
            raw: Some(raw),
        }
    }

    pub(crate) fn boundary(&self) -> &dyn Boundary {
        &*self.boundary
    }

    pub(crate) fn shared(&self) -> &SharedBoundary {
        &self.boundary
    }
}

impl<R: Release> Drop for Scoped<R> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            raw.release(&*self.boundary);
        }
    }
}

impl<R: Release + fmt::Debug> fmt::Debug for Scoped<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scoped").field(&self.raw).finish()
    }
}

/// A result that owns a handle: keep it alive for as long as the handle.
///
/// On failure the result is released at once and the error returned.
pub(crate) fn owned<H: Copy>(
    boundary: &SharedBoundary,
    result: RawResult<H>,
    call: &'static str,
) -> Result<(H, Scoped<RawResult<H>>)>
where
    RawResult<H>: Release,
{
    if let Some(error) = &result.error {
        let failure = Error::from_raw(error);
        result.release(&**boundary);
        return Err(failure);
    }
    if let Some(handle) = result.value {
        return Ok((handle, Scoped::new(boundary, result)));
    }
    result.release(&**boundary);
    Err(missing(call))
}

/// A result carrying a value: convert it, then release the result.
pub(crate) fn value<T, V>(
    boundary: &dyn Boundary,
    result: RawResult<T>,
    call: &'static str,
    convert: impl FnOnce(&T) -> V,
) -> Result<V>
where
    RawResult<T>: Release,
{
    optional(boundary, result, convert)?.ok_or_else(|| missing(call))
}

/// Like [`value`], but an empty success is `None`.
pub(crate) fn optional<T, V>(
    boundary: &dyn Boundary,
    result: RawResult<T>,
    convert: impl FnOnce(&T) -> V,
) -> Result<Option<V>>
where
    RawResult<T>: Release,
{
    let outcome = match &result.error {
        Some(error) => Err(Error::from_raw(error)),
        None => Ok(result.value.as_ref().map(convert)),
    };
    result.release(boundary);
    outcome
}

/// An error-only call.
pub(crate) fn status(boundary: &dyn Boundary, error: Option<RawError>) -> Result<()> {
    match error {
        None => Ok(()),
        Some(error) => {
            let converted = Error::from_raw(&error);
            error.release(boundary);
            Err(converted)
        }
    }
}

/// The byte count of a stream write.
pub(crate) fn written(boundary: &dyn Boundary, result: WriteResult) -> Result<usize> {
    let outcome = match &result.error {
        None => Ok(result.bytes_written),
        Some(error) => Err(Error::from_raw(error)),
    };
    result.release(boundary);
    outcome
}

/// Split a stream error into "end of stream" and real failures.
pub(crate) fn is_eof(error: &RawError) -> bool {
    error.code == codes::EOF
}

fn missing(call: &'static str) -> Error {
    Error::internal(format!("uplink: {call} returned neither a value nor an error"))
}
