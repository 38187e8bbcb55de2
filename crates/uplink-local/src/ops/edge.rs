//! Edge (S3 gateway and linksharing) handlers.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::info;
use uplink_sys::{AccessHandle, RawEdgeCredentials};

use crate::convert::cstring;
use crate::error::{LocalError, LocalResult};
use crate::grant::random_hex;
use crate::provider::LocalUplink;

/// Bytes escaped in share URL path segments. `/` inside keys is kept.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

impl LocalUplink {
    pub(crate) fn handle_edge_register_access(
        &self,
        auth_service_address: &str,
        access: AccessHandle,
        is_public: bool,
    ) -> LocalResult<RawEdgeCredentials> {
        if auth_service_address != self.config.auth_service_address {
            return Err(LocalError::EdgeAuthDialFailed {
                address: auth_service_address.to_owned(),
            });
        }
        let grant = self.universe.access(access)?.read().clone();
        let register_failed = |reason: String| LocalError::EdgeRegisterAccessFailed { reason };
        let (project, tails) = self
            .satellite
            .authenticate(&grant)
            .map_err(|e| register_failed(e.to_string()))?;
        if project.is_revoked(&tails, std::time::Instant::now()) {
            return Err(register_failed("access has been revoked".to_owned()));
        }

        let access_key_id = format!("j{}", random_hex::<14>());
        info!(access_key_id = %access_key_id, is_public, "edge access registered");
        Ok(RawEdgeCredentials {
            access_key_id: cstring(&access_key_id),
            secret_key: cstring(&random_hex::<26>()),
            endpoint: cstring(&self.config.gateway_endpoint),
        })
    }
}

/// Build a linksharing URL for a bucket or object.
pub(crate) fn join_share_url(
    base_url: &str,
    access_key_id: &str,
    bucket: &str,
    key: &str,
    raw: bool,
) -> LocalResult<String> {
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(LocalError::invalid(format!(
            "invalid base url {base_url:?}: scheme must be http or https"
        )));
    }
    if access_key_id.is_empty() {
        return Err(LocalError::invalid("access key id is required"));
    }
    if bucket.is_empty() && !key.is_empty() {
        return Err(LocalError::invalid("bucket is required if key is specified"));
    }
    if raw && key.is_empty() {
        return Err(LocalError::invalid("key is required for a raw download link"));
    }

    let mode = if raw { "raw" } else { "s" };
    let mut url = format!(
        "{}/{mode}/{}",
        base_url.trim_end_matches('/'),
        utf8_percent_encode(access_key_id, PATH_SEGMENT)
    );
    if !bucket.is_empty() {
        url.push('/');
        url.extend(utf8_percent_encode(bucket, PATH_SEGMENT));
    }
    if !key.is_empty() {
        url.push('/');
        url.extend(utf8_percent_encode(key, PATH_SEGMENT));
    }
    Ok(url)
}
