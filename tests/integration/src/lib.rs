//! End-to-end tests of the uplink binding.
//!
//! The binding runs against [`uplink_local::LocalUplink`] in-process, so
//! these tests need no network and run with a plain `cargo test`:
//!
//! ```text
//! cargo test -p uplink-integration
//! ```

use std::sync::{Arc, Once};

use md5::{Digest, Md5};
use rand::RngExt;
use uplink::{Access, CustomMetadata, Project, Uplink};
use uplink_local::{LocalConfig, LocalUplink};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// One peer and a binding talking to it.
#[derive(Debug, Clone)]
pub struct Harness {
    /// The in-process peer, for inspecting its counters.
    pub peer: Arc<LocalUplink>,
    /// The binding under test.
    pub uplink: Uplink,
    /// The peer's configuration.
    pub config: LocalConfig,
}

impl Harness {
    /// A fresh access grant from the default API key.
    #[must_use]
    pub fn access(&self) -> Access {
        self.access_with_passphrase("integration passphrase")
    }

    /// A fresh access grant with a specific passphrase.
    #[must_use]
    pub fn access_with_passphrase(&self, passphrase: &str) -> Access {
        self.uplink
            .request_access_with_passphrase(
                &self.config.satellite_address,
                self.api_key(),
                passphrase,
            )
            .unwrap_or_else(|e| panic!("failed to request access: {e}"))
    }

    /// The first configured API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.config
            .api_keys
            .first()
            .map_or("", String::as_str)
    }

    /// Whether every foreign handle has been released.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.uplink.internal_universe_is_empty()
    }
}

/// A harness over a peer with default settings.
#[must_use]
pub fn harness() -> Harness {
    harness_with(LocalConfig::default())
}

/// A harness over a peer with `config`.
#[must_use]
pub fn harness_with(config: LocalConfig) -> Harness {
    init_tracing();
    let peer = Arc::new(LocalUplink::new(config.clone()));
    let uplink = Uplink::new(peer.clone());
    Harness {
        peer,
        uplink,
        config,
    }
}

/// Open an auto-closing project on `access`.
#[must_use]
pub fn open_project(access: &Access) -> Project {
    access
        .open_project()
        .unwrap_or_else(|e| panic!("failed to open project: {e}"))
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name.
pub fn create_test_bucket(project: &Project, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    project
        .create_bucket(&name)
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// `len` random bytes.
#[must_use]
pub fn random_payload(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf[..]);
    buf
}

/// Hex MD5 of `data`.
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Upload `data` in writes of at most `chunk` bytes (`0` for one write
/// request per remaining tail), then commit.
pub fn upload_bytes(
    project: &Project,
    bucket: &str,
    key: &str,
    data: &[u8],
    chunk: usize,
    custom: Option<&CustomMetadata>,
) -> uplink::Result<()> {
    project.with_upload(bucket, key, None, |upload| {
        let mut uploaded = 0;
        while uploaded < data.len() {
            let left = data.len() - uploaded;
            let len = if chunk == 0 { left } else { chunk.min(left) };
            uploaded += upload.write(&data[uploaded..uploaded + len])?;
        }
        if let Some(custom) = custom {
            upload.set_custom_metadata(custom)?;
        }
        upload.commit()
    })
}

/// Download a whole object, reading `chunk` bytes at a time.
pub fn download_bytes(
    project: &Project,
    bucket: &str,
    key: &str,
    chunk: usize,
) -> uplink::Result<Vec<u8>> {
    project.with_download(bucket, key, None, |download| {
        let mut data = Vec::new();
        download.read_to_end(&mut data, chunk)?;
        Ok(data)
    })
}

mod test_access;
mod test_bucket;
mod test_concurrency;
mod test_edge;
mod test_error;
mod test_list;
mod test_multipart;
mod test_object;
