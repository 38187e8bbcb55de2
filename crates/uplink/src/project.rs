//! Open project sessions.
//!
//! A [`Project`] is the entry point for every bucket, object and
//! multipart call; those live in their own modules as further `impl
//! Project` blocks. The session itself is not mutated by them, so one
//! project can drive many streams and listings from different threads.

use tracing::{debug, info, warn};
use uplink_sys::{Boundary, ProjectHandle, ProjectResult};

use crate::access::Access;
use crate::config::Config;
use crate::download::{Download, DownloadOptions};
use crate::error::Result;
use crate::guard::{self, Scoped, SharedBoundary};
use crate::upload::{Upload, UploadOptions};

/// A session bound to one [`Access`].
///
/// Projects opened with [`Access::open_project`] close themselves when
/// dropped. Projects opened with [`Access::open_project_manual`] must be
/// closed with [`Project::close`].
#[derive(Debug)]
pub struct Project {
    handle: ProjectHandle,
    raw: Scoped<ProjectResult>,
    auto_close: bool,
    closed: bool,
}

impl Project {
    pub(crate) fn open(access: &Access, config: Option<&Config>, auto_close: bool) -> Result<Self> {
        let boundary = access.shared();
        let result = match config {
            Some(config) => boundary.config_open_project(&config.to_raw()?, access.handle()),
            None => boundary.open_project(access.handle()),
        };
        let (handle, raw) = guard::owned(boundary, result, "open_project")?;
        info!(project = %handle, access = %access.handle(), auto_close, "project opened");
        Ok(Self {
            handle,
            raw,
            auto_close,
            closed: false,
        })
    }

    pub(crate) fn handle(&self) -> ProjectHandle {
        self.handle
    }

    pub(crate) fn boundary(&self) -> &dyn Boundary {
        self.raw.boundary()
    }

    pub(crate) fn shared(&self) -> &SharedBoundary {
        self.raw.shared()
    }

    /// Close the session.
    ///
    /// Consumes the project, so a session cannot be closed twice.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        let error = self.boundary().close_project(self.handle);
        guard::status(self.boundary(), error)?;
        info!(project = %self.handle, "project closed");
        Ok(())
    }

    /// Revoke `access`, which must have been derived from the grant this
    /// project was opened with.
    ///
    /// Revocation propagates with a delay. Callers that need to observe it
    /// retry while they see [`ErrorKind::TooManyRequests`] or the revoked
    /// access still working.
    ///
    /// [`ErrorKind::TooManyRequests`]: crate::ErrorKind::TooManyRequests
    pub fn revoke_access(&self, access: &Access) -> Result<()> {
        let error = self.boundary().revoke_access(self.handle, access.handle());
        guard::status(self.boundary(), error)?;
        info!(project = %self.handle, access = %access.handle(), "access revoked");
        Ok(())
    }

    /// Start an upload, hand it to `f`, and abort it if `f` fails.
    ///
    /// `f` is expected to commit. An upload `f` leaves uncommitted is
    /// released without creating the object.
    pub fn with_upload<R>(
        &self,
        bucket: &str,
        key: &str,
        options: Option<&UploadOptions>,
        f: impl FnOnce(&mut Upload<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut upload = self.upload_object(bucket, key, options)?;
        f(&mut upload).inspect_err(|e| {
            if let Err(abort) = upload.abort() {
                debug!(bucket, key, error = %abort, "abort after failed upload scope");
            }
            debug!(bucket, key, error = %e, "upload scope failed");
        })
    }

    /// Open a download, hand it to `f`, and close it on every path.
    ///
    /// An error from `f` takes precedence over a close error.
    pub fn with_download<R>(
        &self,
        bucket: &str,
        key: &str,
        options: Option<&DownloadOptions>,
        f: impl FnOnce(&mut Download<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut download = self.download_object(bucket, key, options)?;
        let outcome = f(&mut download);
        let closed = download.close();
        let value = outcome?;
        closed?;
        Ok(value)
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if self.auto_close {
            let error = self.boundary().close_project(self.handle);
            match guard::status(self.boundary(), error) {
                Ok(()) => info!(project = %self.handle, "project closed on drop"),
                Err(e) => {
                    warn!(project = %self.handle, error = %e, "closing project on drop failed");
                }
            }
        } else {
            warn!(project = %self.handle, "project dropped without close, session leaked");
        }
    }
}
