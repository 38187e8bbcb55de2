//! Access grants and the projects opened from them.
//!
//! An [`Access`] is immutable. [`Access::share`] never narrows the grant
//! in place; it returns a new, independent [`Access`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uplink_sys::{AccessHandle, AccessResult, Boundary, RawPermission, RawSharePrefix};

use crate::config::Config;
use crate::encryption::EncryptionKey;
use crate::error::Result;
use crate::guard::{self, Scoped, SharedBoundary};
use crate::marshal::{cstring, opt_cstring, seconds, string};
use crate::project::Project;

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// Capabilities granted to a shared access.
///
/// The validity window is enforced by the service. Requests outside it
/// fail with the ordinary internal error kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Allow downloads and object stats.
    pub allow_download: bool,
    /// Allow uploads, bucket creation and metadata updates.
    pub allow_upload: bool,
    /// Allow listings.
    pub allow_list: bool,
    /// Allow deletions.
    pub allow_delete: bool,
    /// Not valid before this instant.
    pub not_before: Option<DateTime<Utc>>,
    /// Not valid after this instant.
    pub not_after: Option<DateTime<Utc>>,
}

impl Permission {
    /// Every capability, no validity window.
    #[must_use]
    pub fn full() -> Self {
        Self {
            allow_download: true,
            allow_upload: true,
            allow_list: true,
            allow_delete: true,
            ..Self::default()
        }
    }

    /// Download and list.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            allow_download: true,
            allow_list: true,
            ..Self::default()
        }
    }

    /// Upload and delete.
    #[must_use]
    pub fn write_only() -> Self {
        Self {
            allow_upload: true,
            allow_delete: true,
            ..Self::default()
        }
    }

    pub(crate) fn to_raw(self) -> RawPermission {
        RawPermission {
            allow_download: self.allow_download,
            allow_upload: self.allow_upload,
            allow_list: self.allow_list,
            allow_delete: self.allow_delete,
            not_before: seconds(self.not_before),
            not_after: seconds(self.not_after),
        }
    }
}

/// A bucket, optionally narrowed to a key prefix, that a shared access
/// is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePrefix {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix inside the bucket; `None` is the whole bucket.
    pub prefix: Option<String>,
}

impl SharePrefix {
    /// The whole of `bucket`.
    #[must_use]
    pub fn bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
        }
    }

    /// Keys of `bucket` under `prefix`.
    #[must_use]
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: Some(prefix.into()),
        }
    }

    fn to_raw(&self) -> Result<RawSharePrefix> {
        Ok(RawSharePrefix {
            bucket: cstring("bucket", &self.bucket)?,
            prefix: opt_cstring("prefix", self.prefix.as_deref())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// A parsed, requested or shared access grant.
///
/// The foreign result is released when the value is dropped.
#[derive(Debug)]
pub struct Access {
    handle: AccessHandle,
    raw: Scoped<AccessResult>,
}

impl Access {
    pub(crate) fn from_result(
        boundary: &SharedBoundary,
        result: AccessResult,
        call: &'static str,
    ) -> Result<Self> {
        let (handle, raw) = guard::owned(boundary, result, call)?;
        debug!(access = %handle, call, "access acquired");
        Ok(Self { handle, raw })
    }

    pub(crate) fn handle(&self) -> AccessHandle {
        self.handle
    }

    pub(crate) fn shared(&self) -> &SharedBoundary {
        self.raw.shared()
    }

    fn boundary(&self) -> &dyn Boundary {
        self.raw.boundary()
    }

    /// The satellite this access talks to.
    pub fn satellite_address(&self) -> Result<String> {
        let result = self.boundary().access_satellite_address(self.handle);
        guard::value(self.boundary(), result, "access_satellite_address", |s| {
            string(s)
        })
    }

    /// Serialize for storage or transfer; [`Uplink::parse_access`]
    /// reverses it.
    ///
    /// [`Uplink::parse_access`]: crate::Uplink::parse_access
    pub fn serialize(&self) -> Result<String> {
        let result = self.boundary().access_serialize(self.handle);
        guard::value(self.boundary(), result, "access_serialize", |s| string(s))
    }

    /// Derive a narrower access.
    ///
    /// An empty `prefixes` list keeps every bucket and key reachable.
    pub fn share(&self, permission: &Permission, prefixes: &[SharePrefix]) -> Result<Access> {
        let raw_prefixes = prefixes
            .iter()
            .map(SharePrefix::to_raw)
            .collect::<Result<Vec<_>>>()?;
        let result = self
            .boundary()
            .access_share(self.handle, &permission.to_raw(), &raw_prefixes);
        let shared = Self::from_result(self.shared(), result, "access_share")?;
        info!(
            parent = %self.handle,
            access = %shared.handle,
            prefixes = prefixes.len(),
            "access shared"
        );
        Ok(shared)
    }

    /// Use `key` for objects of `bucket` under `prefix`.
    pub fn override_encryption_key(
        &self,
        bucket: &str,
        prefix: &str,
        key: &EncryptionKey,
    ) -> Result<()> {
        let bucket_c = cstring("bucket", bucket)?;
        let prefix_c = cstring("prefix", prefix)?;
        let error = self.boundary().access_override_encryption_key(
            self.handle,
            &bucket_c,
            &prefix_c,
            key.handle(),
        );
        guard::status(self.boundary(), error)?;
        debug!(bucket, prefix, "encryption key overridden");
        Ok(())
    }

    /// Open a project that closes itself when dropped.
    pub fn open_project(&self) -> Result<Project> {
        Project::open(self, None, true)
    }

    /// [`open_project`](Self::open_project) with connection settings.
    pub fn open_project_with_config(&self, config: &Config) -> Result<Project> {
        Project::open(self, Some(config), true)
    }

    /// Open a project the caller must [`close`](Project::close).
    ///
    /// Dropping it unclosed leaks the session; a warning is logged.
    pub fn open_project_manual(&self) -> Result<Project> {
        Project::open(self, None, false)
    }

    /// [`open_project_manual`](Self::open_project_manual) with connection
    /// settings.
    pub fn open_project_manual_with_config(&self, config: &Config) -> Result<Project> {
        Project::open(self, Some(config), false)
    }

    /// Run `f` against a freshly opened project, closing it afterwards on
    /// every path. An error from `f` takes precedence over a close error.
    pub fn with_project<R>(&self, f: impl FnOnce(&Project) -> Result<R>) -> Result<R> {
        scoped(self.open_project()?, f)
    }

    /// [`with_project`](Self::with_project) with connection settings.
    pub fn with_project_config<R>(
        &self,
        config: &Config,
        f: impl FnOnce(&Project) -> Result<R>,
    ) -> Result<R> {
        scoped(self.open_project_with_config(config)?, f)
    }
}

fn scoped<R>(project: Project, f: impl FnOnce(&Project) -> Result<R>) -> Result<R> {
    let outcome = f(&project);
    let closed = project.close();
    let value = outcome?;
    closed?;
    Ok(value)
}
