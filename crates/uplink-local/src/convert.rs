//! Conversions between boundary structs and peer values.

use std::collections::BTreeMap;
use std::ffi::{CStr, CString};

use chrono::Utc;
use uplink_sys::{RawCustomMetadata, RawCustomMetadataEntry, RawError, RawResult};

use crate::error::{LocalError, LocalResult, to_cstring};

/// Current time in unix seconds.
pub(crate) fn now() -> i64 {
    Utc::now().timestamp()
}

/// Borrow a boundary string as UTF-8.
pub(crate) fn text<'a>(value: &'a CStr, argument: &'static str) -> LocalResult<&'a str> {
    value
        .to_str()
        .map_err(|_| LocalError::InvalidString { argument })
}

/// Borrow an optional boundary string as UTF-8; `None` becomes empty.
pub(crate) fn opt_text<'a>(
    value: Option<&'a CString>,
    argument: &'static str,
) -> LocalResult<&'a str> {
    value.map_or(Ok(""), |v| text(v.as_c_str(), argument))
}

/// Build a boundary string.
pub(crate) fn cstring(value: &str) -> CString {
    to_cstring(value.to_owned())
}

/// Wrap an operation outcome in a paired result.
pub(crate) fn into_result<T>(outcome: LocalResult<T>) -> RawResult<T> {
    match outcome {
        Ok(value) => RawResult::ok(value),
        Err(e) => RawResult::err(e.into_raw()),
    }
}

/// Wrap an optional value; `None` is an empty success.
pub(crate) fn into_optional_result<T>(outcome: LocalResult<Option<T>>) -> RawResult<T> {
    match outcome {
        Ok(Some(value)) => RawResult::ok(value),
        Ok(None) => RawResult::empty(),
        Err(e) => RawResult::err(e.into_raw()),
    }
}

/// Wrap an error-only outcome.
pub(crate) fn into_status(outcome: LocalResult<()>) -> Option<RawError> {
    outcome.err().map(LocalError::into_raw)
}

/// Marshal custom metadata into entry buffers.
pub(crate) fn custom_to_raw(custom: &BTreeMap<String, String>) -> RawCustomMetadata {
    RawCustomMetadata::from_entries(
        custom
            .iter()
            .map(|(k, v)| RawCustomMetadataEntry::new(k.as_bytes(), v.as_bytes()))
            .collect(),
    )
}

/// Decode custom metadata entry buffers. Keys must be non-empty UTF-8.
pub(crate) fn custom_from_raw(raw: &RawCustomMetadata) -> LocalResult<BTreeMap<String, String>> {
    raw.iter()
        .map(|entry| {
            let key = std::str::from_utf8(entry.key_bytes())
                .map_err(|_| LocalError::InvalidString { argument: "metadata key" })?;
            let value = std::str::from_utf8(entry.value_bytes())
                .map_err(|_| LocalError::InvalidString { argument: "metadata value" })?;
            if key.is_empty() {
                return Err(LocalError::invalid("metadata key must not be empty"));
            }
            Ok((key.to_owned(), value.to_owned()))
        })
        .collect()
}
