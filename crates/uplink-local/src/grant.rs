//! Access grants: serialization, caveats, and the signature chain.
//!
//! A grant names a satellite, carries an API key and an encryption root,
//! and may carry a list of caveats added by `share`. The API key is a
//! macaroon-style chain: the satellite's secret signs the key head, each
//! caveat is folded in with HMAC-SHA256, and only the final tail is stored.
//! Whoever holds a grant can add caveats but cannot remove them.
//!
//! Serialized grants are URL-safe base64 of the JSON form.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, KeyInit, Mac};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uplink_sys::RawPermission;

use crate::error::{LocalError, LocalResult};

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `data` under `key`.
pub(crate) fn hmac_hex(key: &[u8], data: &[u8]) -> LocalResult<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| LocalError::Internal(anyhow::anyhow!("hmac key rejected: {e}")))?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Random hex string of `N` bytes.
pub(crate) fn random_hex<const N: usize>() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; N];
    rng.fill(&mut buf);
    hex::encode(buf)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// The capability a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Read,
    Write,
    List,
    Delete,
}

/// What a request touches.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Scope<'a> {
    /// The project as a whole (bucket listing).
    Project,
    /// A bucket.
    Bucket(&'a str),
    /// A single object.
    Object(&'a str, &'a str),
    /// A listing of a bucket below a prefix.
    Listing(&'a str, &'a str),
}

/// One authorization question put to a grant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Request<'a> {
    pub action: Action,
    pub operation: &'static str,
    pub scope: Scope<'a>,
}

impl<'a> Request<'a> {
    pub(crate) fn new(action: Action, operation: &'static str, scope: Scope<'a>) -> Self {
        Self {
            action,
            operation,
            scope,
        }
    }
}

// ---------------------------------------------------------------------------
// Caveats
// ---------------------------------------------------------------------------

/// A bucket and optional key prefix a caveat admits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CaveatPath {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// A restriction added by `share`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Caveat {
    pub disallow_reads: bool,
    pub disallow_writes: bool,
    pub disallow_lists: bool,
    pub disallow_deletes: bool,
    #[serde(default)]
    pub allowed_paths: Vec<CaveatPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<i64>,
    pub nonce: String,
}

impl Caveat {
    pub(crate) fn new(permission: &RawPermission, allowed_paths: Vec<CaveatPath>) -> Self {
        Self {
            disallow_reads: !permission.allow_download,
            disallow_writes: !permission.allow_upload,
            disallow_lists: !permission.allow_list,
            disallow_deletes: !permission.allow_delete,
            allowed_paths,
            not_before: (permission.not_before != 0).then_some(permission.not_before),
            not_after: (permission.not_after != 0).then_some(permission.not_after),
            nonce: random_hex::<8>(),
        }
    }

    /// Whether the caveat forbids everything.
    pub(crate) fn denies_all(&self) -> bool {
        self.disallow_reads && self.disallow_writes && self.disallow_lists && self.disallow_deletes
    }

    fn allows_action(&self, action: Action) -> bool {
        match action {
            Action::Read => !self.disallow_reads,
            Action::Write => !self.disallow_writes,
            Action::List => !self.disallow_lists,
            Action::Delete => !self.disallow_deletes,
        }
    }

    fn allows_time(&self, now: i64) -> bool {
        self.not_before.is_none_or(|t| now >= t) && self.not_after.is_none_or(|t| now <= t)
    }

    fn paths_in<'p>(&'p self, bucket: &'p str) -> impl Iterator<Item = &'p CaveatPath> + 'p {
        self.allowed_paths.iter().filter(move |p| p.bucket == bucket)
    }

    fn allows_scope(&self, scope: Scope<'_>) -> bool {
        if self.allowed_paths.is_empty() {
            return true;
        }
        match scope {
            Scope::Project => true,
            Scope::Bucket(bucket) => self.paths_in(bucket).next().is_some(),
            Scope::Object(bucket, key) => self
                .paths_in(bucket)
                .any(|p| p.prefix.as_deref().is_none_or(|prefix| key.starts_with(prefix))),
            Scope::Listing(bucket, prefix) => self.paths_in(bucket).any(|p| {
                p.prefix.as_deref().is_none_or(|allowed| {
                    prefix.starts_with(allowed) || allowed.starts_with(prefix)
                })
            }),
        }
    }

    fn check(&self, request: &Request<'_>, now: i64) -> bool {
        self.allows_action(request.action)
            && self.allows_time(now)
            && self.allows_scope(request.scope)
    }
}

// ---------------------------------------------------------------------------
// Grant
// ---------------------------------------------------------------------------

/// The API key chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiKey {
    pub head: String,
    #[serde(default)]
    pub caveats: Vec<Caveat>,
    pub tail: String,
}

/// A path-specific encryption key installed on a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EncryptionOverride {
    pub bucket: String,
    pub prefix: String,
    pub key: String,
}

/// A decoded access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Grant {
    pub satellite_address: String,
    pub api_key: ApiKey,
    pub root_key: String,
    #[serde(default)]
    pub overrides: Vec<EncryptionOverride>,
}

impl Grant {
    /// A root grant for `head`, signed by `secret`.
    pub(crate) fn root(
        satellite_address: &str,
        head: &str,
        secret: &[u8],
        passphrase: &str,
    ) -> LocalResult<Self> {
        Ok(Self {
            satellite_address: satellite_address.to_owned(),
            api_key: ApiKey {
                head: head.to_owned(),
                caveats: Vec::new(),
                tail: hmac_hex(secret, head.as_bytes())?,
            },
            root_key: hmac_hex(head.as_bytes(), passphrase.as_bytes())?,
            overrides: Vec::new(),
        })
    }

    pub(crate) fn parse(serialized: &str) -> LocalResult<Self> {
        let invalid = |reason: String| LocalError::InvalidAccess { reason };
        if serialized.is_empty() {
            return Err(invalid("empty access grant".to_owned()));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(serialized.trim())
            .map_err(|e| invalid(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))
    }

    pub(crate) fn serialize(&self) -> LocalResult<String> {
        let json = serde_json::to_vec(self).map_err(anyhow::Error::from)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// A new grant with `caveat` folded into the chain.
    pub(crate) fn restrict(&self, caveat: Caveat) -> LocalResult<Self> {
        let encoded = serde_json::to_vec(&caveat).map_err(anyhow::Error::from)?;
        let mut grant = self.clone();
        grant.api_key.tail = hmac_hex(self.api_key.tail.as_bytes(), &encoded)?;
        grant.api_key.caveats.push(caveat);
        Ok(grant)
    }

    /// Every tail of the chain recomputed from `secret`, root first.
    pub(crate) fn tails(&self, secret: &[u8]) -> LocalResult<Vec<String>> {
        let mut tails = Vec::with_capacity(self.api_key.caveats.len() + 1);
        let mut tail = hmac_hex(secret, self.api_key.head.as_bytes())?;
        tails.push(tail.clone());
        for caveat in &self.api_key.caveats {
            let encoded = serde_json::to_vec(caveat).map_err(anyhow::Error::from)?;
            tail = hmac_hex(tail.as_bytes(), &encoded)?;
            tails.push(tail.clone());
        }
        Ok(tails)
    }

    /// Check every caveat against `request` at time `now`.
    pub(crate) fn check(&self, request: &Request<'_>, now: i64) -> LocalResult<()> {
        if self.api_key.caveats.iter().all(|c| c.check(request, now)) {
            Ok(())
        } else {
            Err(LocalError::PermissionDenied {
                operation: request.operation,
            })
        }
    }

    /// Whether every caveat admits `scope`, ignoring action and time.
    pub(crate) fn admits(&self, scope: Scope<'_>) -> bool {
        self.api_key.caveats.iter().all(|c| c.allows_scope(scope))
    }

    pub(crate) fn override_key(&mut self, bucket: &str, prefix: &str, key: &str) {
        self.overrides
            .retain(|o| !(o.bucket == bucket && o.prefix == prefix));
        self.overrides.push(EncryptionOverride {
            bucket: bucket.to_owned(),
            prefix: prefix.to_owned(),
            key: key.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"satellite-secret";

    fn root() -> Grant {
        Grant::root("sat@localhost:7777", "key-head", SECRET, "pass")
            .unwrap_or_else(|e| panic!("root grant failed: {e}"))
    }

    fn upload_only() -> RawPermission {
        RawPermission {
            allow_upload: true,
            ..RawPermission::default()
        }
    }

    #[test]
    fn test_should_round_trip_serialized_grant() {
        let grant = root();
        let serialized = grant.serialize().unwrap_or_else(|e| panic!("{e}"));
        let parsed = Grant::parse(&serialized).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(parsed, grant);
    }

    #[test]
    fn test_should_reject_malformed_grant() {
        assert!(matches!(
            Grant::parse("not a grant!"),
            Err(LocalError::InvalidAccess { .. })
        ));
        assert!(matches!(Grant::parse(""), Err(LocalError::InvalidAccess { .. })));
    }

    #[test]
    fn test_should_extend_chain_verifiably() {
        let shared = root()
            .restrict(Caveat::new(&upload_only(), Vec::new()))
            .unwrap_or_else(|e| panic!("{e}"));
        let tails = shared.tails(SECRET).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(tails.len(), 2);
        assert_eq!(tails.last(), Some(&shared.api_key.tail));
        assert_eq!(tails[0], root().api_key.tail);
    }

    #[test]
    fn test_should_detect_stripped_caveat() {
        let mut shared = root()
            .restrict(Caveat::new(&upload_only(), Vec::new()))
            .unwrap_or_else(|e| panic!("{e}"));
        shared.api_key.caveats.clear();
        let tails = shared.tails(SECRET).unwrap_or_else(|e| panic!("{e}"));
        assert_ne!(tails.last(), Some(&shared.api_key.tail));
    }

    #[test]
    fn test_should_enforce_action_and_prefix() {
        let paths = vec![CaveatPath {
            bucket: "b".to_owned(),
            prefix: Some("foo/".to_owned()),
        }];
        let shared = root()
            .restrict(Caveat::new(&upload_only(), paths))
            .unwrap_or_else(|e| panic!("{e}"));

        let write = |scope| Request::new(Action::Write, "upload", scope);
        assert!(shared.check(&write(Scope::Object("b", "foo/x")), 0).is_ok());
        assert!(shared.check(&write(Scope::Object("b", "test.txt")), 0).is_err());
        assert!(shared.check(&write(Scope::Object("b", "bar/x")), 0).is_err());
        assert!(shared.check(&write(Scope::Object("other", "foo/x")), 0).is_err());
        assert!(shared.check(&write(Scope::Bucket("b")), 0).is_ok());

        let read = Request::new(Action::Read, "download", Scope::Object("b", "foo/x"));
        assert!(shared.check(&read, 0).is_err());
    }

    #[test]
    fn test_should_enforce_time_window() {
        let permission = RawPermission {
            allow_download: true,
            not_before: 100,
            not_after: 200,
            ..RawPermission::default()
        };
        let shared = root()
            .restrict(Caveat::new(&permission, Vec::new()))
            .unwrap_or_else(|e| panic!("{e}"));
        let read = Request::new(Action::Read, "download", Scope::Object("b", "k"));
        assert!(shared.check(&read, 50).is_err());
        assert!(shared.check(&read, 150).is_ok());
        assert!(shared.check(&read, 250).is_err());
    }

    #[test]
    fn test_should_admit_listing_above_allowed_prefix() {
        let paths = vec![CaveatPath {
            bucket: "b".to_owned(),
            prefix: Some("foo/bar/".to_owned()),
        }];
        let shared = root()
            .restrict(Caveat::new(&upload_only(), paths))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(shared.admits(Scope::Listing("b", "")));
        assert!(shared.admits(Scope::Listing("b", "foo/")));
        assert!(!shared.admits(Scope::Listing("b", "baz/")));
    }

    #[test]
    fn test_should_replace_encryption_override() {
        let mut grant = root();
        grant.override_key("b", "p/", "k1");
        grant.override_key("b", "p/", "k2");
        assert_eq!(grant.overrides.len(), 1);
        assert_eq!(grant.overrides[0].key, "k2");
    }
}
