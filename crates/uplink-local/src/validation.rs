//! Bucket name and object key rules enforced by the simulated satellite.

use std::net::Ipv4Addr;

use crate::error::LocalError;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Maximum object key length in bytes.
const MAX_KEY_BYTES: usize = 1024;

/// Validate a bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No consecutive dots and no dot next to a hyphen
/// - Not formatted as an IPv4 address
///
/// # Examples
///
/// ```
/// use uplink_local::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-valid-bucket").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), LocalError> {
    let invalid = |reason: &str| LocalError::BucketNameInvalid {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    let len = name.len();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(&format!(
            "bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
        )));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid(
            "bucket name must only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[len - 1];
    if !(first.is_ascii_lowercase() || first.is_ascii_digit())
        || !(last.is_ascii_lowercase() || last.is_ascii_digit())
    {
        return Err(invalid("bucket name must start and end with a letter or number"));
    }

    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return Err(invalid("bucket name labels must not be empty or hyphen-bounded"));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid("bucket name must not be formatted as an IP address"));
    }

    Ok(())
}

/// Validate an object key: non-empty and at most 1024 bytes.
pub fn validate_object_key(key: &str) -> Result<(), LocalError> {
    if key.is_empty() || key.len() > MAX_KEY_BYTES {
        return Err(LocalError::ObjectKeyInvalid { key: key.to_owned() });
    }
    Ok(())
}
