//! Configuration of the in-process peer.
//!
//! Provides [`LocalConfig`]: the satellite identity the peer answers to,
//! the API keys it accepts, and the project limits it enforces. Values can
//! be loaded from `UPLINK_LOCAL_*` environment variables.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Satellite address the peer answers to by default.
pub const DEFAULT_SATELLITE_ADDRESS: &str =
    "12EayRS2V1kEsWESU9QMRseFhdxYxKicsiFmxrsLZHeLUtdps3S@localhost:7777";

/// API key accepted by default.
pub const DEFAULT_API_KEY: &str = "13YqeGFpvtzbUp1QAfpvy2E5ZqLUFFNhEkv7153UDGDVnSmTuYYa7";

/// Auth service address accepted by default.
pub const DEFAULT_AUTH_SERVICE_ADDRESS: &str = "auth.storjshare.io:7777";

/// Gateway endpoint handed out with edge credentials.
pub const DEFAULT_GATEWAY_ENDPOINT: &str = "https://gateway.storjshare.io";

/// Smallest size of a multipart part that is not the last one.
pub const DEFAULT_MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Peer configuration.
///
/// Limits of `0` are disabled. `max_write_chunk` and `max_read_chunk` cap
/// the bytes a single stream call moves, so callers see partial transfers
/// the same way they would over the network.
///
/// # Examples
///
/// ```
/// use uplink_local::LocalConfig;
///
/// let config = LocalConfig::default();
/// assert_eq!(config.min_part_size, 5 * 1024 * 1024);
/// assert_eq!(config.api_keys.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    /// `node-id@host:port` of the simulated satellite.
    #[builder(default = String::from(DEFAULT_SATELLITE_ADDRESS))]
    pub satellite_address: String,

    /// API keys that may request access grants.
    #[builder(default = vec![String::from(DEFAULT_API_KEY)])]
    pub api_keys: Vec<String>,

    /// `host:port` of the simulated edge auth service.
    #[builder(default = String::from(DEFAULT_AUTH_SERVICE_ADDRESS))]
    pub auth_service_address: String,

    /// Endpoint returned with edge credentials.
    #[builder(default = String::from(DEFAULT_GATEWAY_ENDPOINT))]
    pub gateway_endpoint: String,

    /// Minimum size of every multipart part except the last.
    #[builder(default = DEFAULT_MIN_PART_SIZE)]
    pub min_part_size: u64,

    /// Maximum bytes accepted by one write call.
    #[builder(default = 64 * 1024)]
    pub max_write_chunk: usize,

    /// Maximum bytes produced by one read call.
    #[builder(default = 32 * 1024)]
    pub max_read_chunk: usize,

    /// Empty, non-final reads served before the first byte of every
    /// download, as a slow network would.
    #[builder(default = 0)]
    pub stalled_reads: usize,

    /// Storage limit per project in bytes.
    #[builder(default = 0)]
    pub storage_limit: u64,

    /// Egress limit per project in bytes.
    #[builder(default = 0)]
    pub bandwidth_limit: u64,

    /// Segment limit per project.
    #[builder(default = 0)]
    pub segment_limit: u64,

    /// Requests allowed per second per open project.
    #[builder(default = 0)]
    pub rate_limit: u32,

    /// Milliseconds before a revocation takes effect.
    #[builder(default = 0)]
    pub revocation_delay_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LocalConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `UPLINK_LOCAL_SATELLITE_ADDRESS` | [`DEFAULT_SATELLITE_ADDRESS`] |
    /// | `UPLINK_LOCAL_API_KEYS` | [`DEFAULT_API_KEY`] (comma separated) |
    /// | `UPLINK_LOCAL_AUTH_SERVICE_ADDRESS` | [`DEFAULT_AUTH_SERVICE_ADDRESS`] |
    /// | `UPLINK_LOCAL_GATEWAY_ENDPOINT` | [`DEFAULT_GATEWAY_ENDPOINT`] |
    /// | `UPLINK_LOCAL_MIN_PART_SIZE` | `5242880` |
    /// | `UPLINK_LOCAL_MAX_WRITE_CHUNK` | `65536` |
    /// | `UPLINK_LOCAL_MAX_READ_CHUNK` | `32768` |
    /// | `UPLINK_LOCAL_STALLED_READS` | `0` |
    /// | `UPLINK_LOCAL_STORAGE_LIMIT` | `0` |
    /// | `UPLINK_LOCAL_BANDWIDTH_LIMIT` | `0` |
    /// | `UPLINK_LOCAL_SEGMENT_LIMIT` | `0` |
    /// | `UPLINK_LOCAL_RATE_LIMIT` | `0` |
    /// | `UPLINK_LOCAL_REVOCATION_DELAY_MS` | `0` |
    /// | `UPLINK_LOCAL_UNLIMITED` | `false`; when set, clears every limit |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("UPLINK_LOCAL_SATELLITE_ADDRESS") {
            config.satellite_address = v;
        }
        if let Ok(v) = std::env::var("UPLINK_LOCAL_API_KEYS") {
            config.api_keys = v
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Ok(v) = std::env::var("UPLINK_LOCAL_AUTH_SERVICE_ADDRESS") {
            config.auth_service_address = v;
        }
        if let Ok(v) = std::env::var("UPLINK_LOCAL_GATEWAY_ENDPOINT") {
            config.gateway_endpoint = v;
        }
        env_number("UPLINK_LOCAL_MIN_PART_SIZE", &mut config.min_part_size);
        env_number("UPLINK_LOCAL_MAX_WRITE_CHUNK", &mut config.max_write_chunk);
        env_number("UPLINK_LOCAL_MAX_READ_CHUNK", &mut config.max_read_chunk);
        env_number("UPLINK_LOCAL_STALLED_READS", &mut config.stalled_reads);
        env_number("UPLINK_LOCAL_STORAGE_LIMIT", &mut config.storage_limit);
        env_number("UPLINK_LOCAL_BANDWIDTH_LIMIT", &mut config.bandwidth_limit);
        env_number("UPLINK_LOCAL_SEGMENT_LIMIT", &mut config.segment_limit);
        env_number("UPLINK_LOCAL_RATE_LIMIT", &mut config.rate_limit);
        env_number(
            "UPLINK_LOCAL_REVOCATION_DELAY_MS",
            &mut config.revocation_delay_ms,
        );
        if let Ok(v) = std::env::var("UPLINK_LOCAL_UNLIMITED") {
            if parse_bool(&v) {
                config.storage_limit = 0;
                config.bandwidth_limit = 0;
                config.segment_limit = 0;
                config.rate_limit = 0;
            }
        }

        config
    }
}

fn env_number<T: std::str::FromStr>(name: &str, slot: &mut T) {
    if let Ok(v) = std::env::var(name) {
        if let Ok(n) = v.parse::<T>() {
            *slot = n;
        }
    }
}

/// Parse a string as a boolean, accepting `1`, `true`, `yes` and `on`.
fn parse_bool(value: &str) -> bool {
    value == "1"
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}
