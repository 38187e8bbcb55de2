//! Connection configuration.
//!
//! A [`Config`] is optional everywhere it is accepted; without one the
//! library uses its own defaults. Values can be loaded from `UPLINK_*`
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uplink_sys::RawConfig;

use crate::error::{Error, Result};
use crate::marshal::opt_cstring;

/// Dial and identification settings.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use uplink::Config;
///
/// let config = Config::builder()
///     .user_agent(Some("backup-tool/1.0".into()))
///     .dial_timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.dial_timeout, Duration::from_secs(10));
/// assert!(config.temp_directory.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Sent to the satellite to identify the calling application.
    #[builder(default)]
    pub user_agent: Option<String>,

    /// Bound on connection setup; zero uses the library default.
    #[builder(default)]
    pub dial_timeout: Duration,

    /// Where the library may buffer data on disk.
    #[builder(default)]
    pub temp_directory: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `UPLINK_USER_AGENT` | unset |
    /// | `UPLINK_DIAL_TIMEOUT_MS` | `0` (library default) |
    /// | `UPLINK_TEMP_DIR` | unset |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("UPLINK_USER_AGENT") {
            if !v.is_empty() {
                config.user_agent = Some(v);
            }
        }
        if let Ok(v) = std::env::var("UPLINK_DIAL_TIMEOUT_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                config.dial_timeout = Duration::from_millis(ms);
            }
        }
        if let Ok(v) = std::env::var("UPLINK_TEMP_DIR") {
            if !v.is_empty() {
                config.temp_directory = Some(PathBuf::from(v));
            }
        }

        config
    }

    pub(crate) fn to_raw(&self) -> Result<RawConfig> {
        let dial_timeout_milliseconds =
            i32::try_from(self.dial_timeout.as_millis()).map_err(|_| {
                Error::invalid_argument("dial_timeout", "does not fit in i32 milliseconds")
            })?;
        let temp_directory = match &self.temp_directory {
            Some(path) => Some(path.to_str().ok_or_else(|| {
                Error::invalid_argument("temp_directory", "path is not valid UTF-8")
            })?),
            None => None,
        };
        Ok(RawConfig {
            user_agent: opt_cstring("user_agent", self.user_agent.as_deref())?,
            dial_timeout_milliseconds,
            temp_directory: opt_cstring("temp_directory", temp_directory)?,
        })
    }
}
