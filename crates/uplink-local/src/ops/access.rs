//! Access grant and project session handlers.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uplink_sys::{AccessHandle, EncryptionKeyHandle, ProjectHandle, RawPermission};

use crate::error::{LocalError, LocalResult};
use crate::grant::{Caveat, CaveatPath, Grant, hmac_hex};
use crate::provider::LocalUplink;
use crate::session::Session;

impl LocalUplink {
    /// Decode a serialized grant. Grants for this satellite must verify.
    pub(crate) fn handle_parse_access(&self, serialized: &str) -> LocalResult<AccessHandle> {
        let grant = Grant::parse(serialized)?;
        if grant.satellite_address == self.satellite.address() {
            self.satellite
                .authenticate(&grant)
                .map_err(|e| LocalError::InvalidAccess {
                    reason: e.to_string(),
                })?;
        }
        debug!(
            satellite = %grant.satellite_address,
            caveats = grant.api_key.caveats.len(),
            "access parsed"
        );
        Ok(self.universe.insert_access(Arc::new(RwLock::new(grant))))
    }

    pub(crate) fn handle_request_access(
        &self,
        user_agent: Option<&str>,
        satellite_address: &str,
        api_key: &str,
        passphrase: &str,
    ) -> LocalResult<AccessHandle> {
        let grant = self
            .satellite
            .request_access(satellite_address, api_key, passphrase)?;
        debug!(user_agent = user_agent.unwrap_or_default(), "access requested");
        Ok(self.universe.insert_access(Arc::new(RwLock::new(grant))))
    }

    pub(crate) fn handle_access_satellite_address(
        &self,
        access: AccessHandle,
    ) -> LocalResult<String> {
        Ok(self.universe.access(access)?.read().satellite_address.clone())
    }

    pub(crate) fn handle_access_serialize(&self, access: AccessHandle) -> LocalResult<String> {
        self.universe.access(access)?.read().serialize()
    }

    /// Derive a restricted grant with one more caveat.
    pub(crate) fn handle_access_share(
        &self,
        access: AccessHandle,
        permission: &RawPermission,
        prefixes: Vec<CaveatPath>,
    ) -> LocalResult<AccessHandle> {
        let parent = self.universe.access(access)?;
        if prefixes.iter().any(|p| p.bucket.is_empty()) {
            return Err(LocalError::invalid("share prefix bucket must not be empty"));
        }
        let caveat = Caveat::new(permission, prefixes);
        if caveat.denies_all() {
            return Err(LocalError::invalid("permission is empty"));
        }
        let derived = parent.read().restrict(caveat)?;
        info!(
            caveats = derived.api_key.caveats.len(),
            download = permission.allow_download,
            upload = permission.allow_upload,
            list = permission.allow_list,
            delete = permission.allow_delete,
            "access shared"
        );
        Ok(self.universe.insert_access(Arc::new(RwLock::new(derived))))
    }

    pub(crate) fn handle_override_encryption_key(
        &self,
        access: AccessHandle,
        bucket: &str,
        prefix: &str,
        key: EncryptionKeyHandle,
    ) -> LocalResult<()> {
        let grant = self.universe.access(access)?;
        let key = self.universe.encryption_key(key)?;
        if bucket.is_empty() {
            return Err(LocalError::invalid("bucket must not be empty"));
        }
        grant.write().override_key(bucket, prefix, &key);
        debug!(bucket = %bucket, prefix = %prefix, "encryption key override installed");
        Ok(())
    }

    pub(crate) fn handle_derive_encryption_key(
        &self,
        passphrase: &str,
        salt: &[u8],
    ) -> LocalResult<EncryptionKeyHandle> {
        if passphrase.is_empty() {
            return Err(LocalError::invalid("passphrase must not be empty"));
        }
        let key = hmac_hex(salt, passphrase.as_bytes())?;
        Ok(self.universe.insert_encryption_key(Arc::new(key)))
    }

    // -----------------------------------------------------------------------
    // Project
    // -----------------------------------------------------------------------

    pub(crate) fn handle_open_project(
        &self,
        access: AccessHandle,
        user_agent: Option<String>,
    ) -> LocalResult<ProjectHandle> {
        let grant = self.universe.access(access)?.read().clone();
        let (project, tails) = self.satellite.authenticate(&grant)?;
        let session = Session::new(
            grant,
            tails,
            project,
            Arc::clone(&self.config),
            user_agent,
        );
        if session.is_revoked() {
            return Err(LocalError::PermissionDenied {
                operation: "open_project",
            });
        }
        info!(session = %session.id, api_key = %session.project.api_key, "project opened");
        self.unclosed.fetch_add(1, Ordering::AcqRel);
        Ok(self.universe.insert_project(Arc::new(session)))
    }

    pub(crate) fn handle_close_project(&self, project: ProjectHandle) -> LocalResult<()> {
        let session = self.universe.project(project)?;
        session.close()?;
        self.unclosed.fetch_sub(1, Ordering::AcqRel);
        debug!(session = %session.id, "project closed");
        Ok(())
    }

    /// Record the tail of `access` as revoked in the session's project.
    pub(crate) fn handle_revoke_access(
        &self,
        project: ProjectHandle,
        access: AccessHandle,
    ) -> LocalResult<()> {
        let session = self.universe.project(project)?;
        let target = self.universe.access(access)?.read().clone();
        session.ensure_active("revoke_access")?;

        let (target_project, target_tails) = self.satellite.authenticate(&target)?;
        if !Arc::ptr_eq(&target_project, &session.project) {
            return Err(LocalError::PermissionDenied {
                operation: "revoke_access",
            });
        }
        if target_tails.len() <= 1 {
            return Err(LocalError::invalid("the root access cannot be revoked"));
        }
        if !target_tails.starts_with(&session.tails) {
            return Err(LocalError::PermissionDenied {
                operation: "revoke_access",
            });
        }

        let delay = Duration::from_millis(self.config.revocation_delay_ms);
        session
            .project
            .revoke(target.api_key.tail.clone(), Instant::now() + delay);
        info!(session = %session.id, delay_ms = self.config.revocation_delay_ms, "access revoked");
        Ok(())
    }

    /// Drop a project handle. A session released without close stays
    /// counted by [`LocalUplink::open_sessions`] but stops serving requests.
    pub(crate) fn release_project(&self, project: ProjectHandle) {
        if let Some(session) = self.universe.remove_project(project)
            && session.close().is_ok()
        {
            warn!(session = %session.id, "project released without close");
        }
    }
}
