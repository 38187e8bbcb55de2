//! Entry point: the library handle and the access factories.

use std::sync::Arc;

use tracing::debug;
use uplink_sys::Boundary;

use crate::access::Access;
use crate::config::Config;
use crate::encryption::EncryptionKey;
use crate::error::Result;
use crate::guard::SharedBoundary;
use crate::marshal::cstring;

/// A loaded uplink library.
///
/// Cloning is cheap; every clone talks to the same boundary.
#[derive(Debug, Clone)]
pub struct Uplink {
    boundary: SharedBoundary,
}

impl Uplink {
    /// Wrap a boundary implementation.
    #[must_use]
    pub fn new(boundary: Arc<dyn Boundary>) -> Self {
        Self { boundary }
    }

    /// Decode a serialized access grant.
    pub fn parse_access(&self, serialized: &str) -> Result<Access> {
        let serialized_c = cstring("access", serialized)?;
        let result = self.boundary.parse_access(&serialized_c);
        Access::from_result(&self.boundary, result, "parse_access")
    }

    /// Parse an access, hand it to `f`, and release it when `f` returns.
    pub fn with_parsed_access<R>(
        &self,
        serialized: &str,
        f: impl FnOnce(&Access) -> Result<R>,
    ) -> Result<R> {
        let access = self.parse_access(serialized)?;
        f(&access)
    }

    /// Request an access grant from a satellite.
    pub fn request_access_with_passphrase(
        &self,
        satellite_address: &str,
        api_key: &str,
        passphrase: &str,
    ) -> Result<Access> {
        let satellite_c = cstring("satellite_address", satellite_address)?;
        let api_key_c = cstring("api_key", api_key)?;
        let passphrase_c = cstring("passphrase", passphrase)?;
        debug!(satellite = satellite_address, "requesting access");
        let result =
            self.boundary
                .request_access_with_passphrase(&satellite_c, &api_key_c, &passphrase_c);
        Access::from_result(&self.boundary, result, "request_access_with_passphrase")
    }

    /// [`request_access_with_passphrase`](Self::request_access_with_passphrase)
    /// with dial settings.
    pub fn request_access_with_passphrase_and_config(
        &self,
        config: &Config,
        satellite_address: &str,
        api_key: &str,
        passphrase: &str,
    ) -> Result<Access> {
        let raw_config = config.to_raw()?;
        let satellite_c = cstring("satellite_address", satellite_address)?;
        let api_key_c = cstring("api_key", api_key)?;
        let passphrase_c = cstring("passphrase", passphrase)?;
        debug!(
            satellite = satellite_address,
            user_agent = ?config.user_agent,
            "requesting access with config"
        );
        let result = self.boundary.config_request_access_with_passphrase(
            &raw_config,
            &satellite_c,
            &api_key_c,
            &passphrase_c,
        );
        Access::from_result(
            &self.boundary,
            result,
            "config_request_access_with_passphrase",
        )
    }

    /// Derive a key from `passphrase` and an arbitrary `salt`.
    pub fn derive_encryption_key(&self, passphrase: &str, salt: &[u8]) -> Result<EncryptionKey> {
        let passphrase_c = cstring("passphrase", passphrase)?;
        let result = self.boundary.derive_encryption_key(&passphrase_c, salt);
        EncryptionKey::from_result(&self.boundary, result)
    }

    /// Whether every foreign handle issued so far has been released.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn internal_universe_is_empty(&self) -> bool {
        self.boundary.internal_universe_is_empty()
    }
}
