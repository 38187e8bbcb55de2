//! Conversions between Rust values and boundary structs.

use std::ffi::{CStr, CString};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Marshal a string argument. Interior NUL bytes cannot cross the boundary.
pub(crate) fn cstring(argument: &'static str, value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| {
        Error::invalid_argument(
            argument,
            format!("interior NUL byte at position {}", e.nul_position()),
        )
    })
}

pub(crate) fn opt_cstring(argument: &'static str, value: Option<&str>) -> Result<Option<CString>> {
    value.map(|v| cstring(argument, v)).transpose()
}

pub(crate) fn string(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

/// Unix seconds to a timestamp; `0` is "not set".
pub(crate) fn time(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        None
    } else {
        DateTime::from_timestamp(seconds, 0)
    }
}

pub(crate) fn seconds(time: Option<DateTime<Utc>>) -> i64 {
    time.map_or(0, |t| t.timestamp())
}
