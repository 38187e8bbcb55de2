//! S3-compatible gateway credentials and share URLs.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;
use uplink_sys::{
    RawEdgeConfig, RawEdgeCredentials, RawEdgeRegisterAccessOptions, RawShareUrlOptions,
};

use crate::access::Access;
use crate::error::Result;
use crate::guard::{self, SharedBoundary};
use crate::marshal::{cstring, opt_cstring, string};

/// How to reach the edge auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
    /// `host:port` of the auth service.
    pub auth_service_address: String,
    /// PEM root certificate to trust instead of the system store.
    pub certificate_pem: Option<String>,
    /// Skip TLS entirely. Only for local test deployments.
    pub insecure_unencrypted_connection: bool,
}

impl EdgeConfig {
    /// An auth service reached over TLS with the system roots.
    #[must_use]
    pub fn new(auth_service_address: impl Into<String>) -> Self {
        Self {
            auth_service_address: auth_service_address.into(),
            certificate_pem: None,
            insecure_unencrypted_connection: false,
        }
    }

    fn to_raw(&self) -> Result<RawEdgeConfig> {
        Ok(RawEdgeConfig {
            auth_service_address: cstring("auth_service_address", &self.auth_service_address)?,
            certificate_pem: opt_cstring("certificate_pem", self.certificate_pem.as_deref())?,
            insecure_unencrypted_connection: self.insecure_unencrypted_connection,
        })
    }
}

/// Options for [`Access::edge_register_access`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAccessOptions {
    /// Allow the credentials to serve anonymous share links.
    pub is_public: bool,
}

/// Options for [`EdgeCredential::join_share_url`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareUrlOptions {
    /// Link the content itself rather than its landing page.
    pub raw: bool,
}

/// Gateway credentials registered for an access.
#[derive(Clone)]
pub struct EdgeCredential {
    /// S3 access key id.
    pub access_key_id: String,
    /// S3 secret key.
    pub secret_key: String,
    /// Gateway endpoint the credentials are valid for.
    pub endpoint: String,
    boundary: SharedBoundary,
}

impl EdgeCredential {
    fn from_raw(boundary: &SharedBoundary, raw: &RawEdgeCredentials) -> Self {
        Self {
            access_key_id: string(&raw.access_key_id),
            secret_key: string(&raw.secret_key),
            endpoint: string(&raw.endpoint),
            boundary: SharedBoundary::clone(boundary),
        }
    }

    /// A linksharing URL under `base_url` for a bucket, or an object when
    /// `key` is given. A raw link needs a key.
    pub fn join_share_url(
        &self,
        base_url: &str,
        bucket: &str,
        key: Option<&str>,
        options: &ShareUrlOptions,
    ) -> Result<String> {
        let base_url_c = cstring("base_url", base_url)?;
        let access_key_id_c = cstring("access_key_id", &self.access_key_id)?;
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key.unwrap_or_default())?;
        let raw_options = RawShareUrlOptions { raw: options.raw };
        let result = self.boundary.edge_join_share_url(
            &base_url_c,
            &access_key_id_c,
            &bucket_c,
            &key_c,
            Some(&raw_options),
        );
        guard::value(&*self.boundary, result, "edge_join_share_url", |s| string(s))
    }
}

impl fmt::Debug for EdgeCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeCredential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Access {
    /// Register this access with the edge auth service, yielding S3
    /// gateway credentials.
    pub fn edge_register_access(
        &self,
        config: &EdgeConfig,
        options: &RegisterAccessOptions,
    ) -> Result<EdgeCredential> {
        let raw_config = config.to_raw()?;
        let raw_options = RawEdgeRegisterAccessOptions {
            is_public: options.is_public,
        };
        let boundary = self.shared();
        let result = boundary.edge_register_access(&raw_config, self.handle(), Some(&raw_options));
        let credential = guard::value(&**boundary, result, "edge_register_access", |raw| {
            EdgeCredential::from_raw(boundary, raw)
        })?;
        info!(
            auth_service = %config.auth_service_address,
            access_key_id = %credential.access_key_id,
            is_public = options.is_public,
            "edge access registered"
        );
        Ok(credential)
    }
}
