//! The simulated satellite: API keys, projects, and grant verification.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use super::project::ProjectState;
use crate::error::{LocalError, LocalResult};
use crate::grant::{Grant, random_hex};

/// Satellite-wide state.
#[derive(Debug)]
pub struct Satellite {
    address: String,
    secret: String,
    projects: DashMap<String, Arc<ProjectState>>,
}

impl Satellite {
    /// A satellite reachable at `address` accepting `api_keys`.
    #[must_use]
    pub fn new(address: String, api_keys: &[String]) -> Self {
        let projects = DashMap::new();
        for key in api_keys {
            projects.insert(key.clone(), Arc::new(ProjectState::new(key.clone())));
        }
        Self {
            address,
            secret: random_hex::<32>(),
            projects,
        }
    }

    /// The address this satellite answers to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The project behind an API key.
    #[must_use]
    pub fn project(&self, api_key: &str) -> Option<Arc<ProjectState>> {
        self.projects.get(api_key).map(|p| Arc::clone(p.value()))
    }

    /// Fail unless `address` is this satellite.
    pub fn dial(&self, address: &str) -> LocalResult<()> {
        if address == self.address {
            Ok(())
        } else {
            Err(LocalError::DialFailed {
                address: address.to_owned(),
            })
        }
    }

    /// Issue a root grant for a known API key.
    pub(crate) fn request_access(
        &self,
        address: &str,
        api_key: &str,
        passphrase: &str,
    ) -> LocalResult<Grant> {
        self.dial(address)?;
        if !self.projects.contains_key(api_key) {
            return Err(LocalError::InvalidApiKey);
        }
        if passphrase.is_empty() {
            return Err(LocalError::invalid("passphrase must not be empty"));
        }
        info!(satellite = %address, "access granted");
        Grant::root(&self.address, api_key, self.secret.as_bytes(), passphrase)
    }

    /// Verify the chain of `grant`. Returns its project and every chain tail.
    pub(crate) fn authenticate(
        &self,
        grant: &Grant,
    ) -> LocalResult<(Arc<ProjectState>, Vec<String>)> {
        self.dial(&grant.satellite_address)?;
        let project = self
            .projects
            .get(&grant.api_key.head)
            .map(|p| Arc::clone(p.value()))
            .ok_or(LocalError::InvalidApiKey)?;
        let tails = grant.tails(self.secret.as_bytes())?;
        if tails.last() != Some(&grant.api_key.tail) {
            debug!(api_key = %grant.api_key.head, "grant signature mismatch");
            return Err(LocalError::InvalidApiKey);
        }
        Ok((project, tails))
    }
}
