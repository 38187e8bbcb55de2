//! Open project sessions.
//!
//! A [`Session`] binds a verified grant to its project. Every request goes
//! through [`Session::authorize`], which applies, in order: the closed
//! flag, the per-session rate limit, revocation, and the grant's caveats.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::LocalConfig;
use crate::convert::now;
use crate::error::{LocalError, LocalResult};
use crate::grant::{Grant, Request};
use crate::state::ProjectState;

/// An open project session.
#[derive(Debug)]
pub(crate) struct Session {
    pub id: Uuid,
    pub grant: Grant,
    pub tails: Vec<String>,
    pub project: Arc<ProjectState>,
    pub config: Arc<LocalConfig>,
    pub user_agent: Option<String>,
    closed: AtomicBool,
    window: Mutex<(Instant, u32)>,
}

impl Session {
    pub(crate) fn new(
        grant: Grant,
        tails: Vec<String>,
        project: Arc<ProjectState>,
        config: Arc<LocalConfig>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            grant,
            tails,
            project,
            config,
            user_agent,
            closed: AtomicBool::new(false),
            window: Mutex::new((Instant::now(), 0)),
        }
    }

    /// Mark closed. Fails if it already was.
    pub(crate) fn close(&self) -> LocalResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(LocalError::ProjectClosed);
        }
        Ok(())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether this session's grant has been revoked.
    pub(crate) fn is_revoked(&self) -> bool {
        self.project.is_revoked(&self.tails, Instant::now())
    }

    /// Authorize one request.
    pub(crate) fn authorize(&self, request: &Request<'_>) -> LocalResult<()> {
        self.ensure_active(request.operation)?;
        self.grant.check(request, now())
    }

    /// The checks every call makes before caveats are consulted.
    pub(crate) fn ensure_active(&self, operation: &'static str) -> LocalResult<()> {
        if self.is_closed() {
            return Err(LocalError::ProjectClosed);
        }
        self.throttle()?;
        if self.is_revoked() {
            return Err(LocalError::PermissionDenied { operation });
        }
        Ok(())
    }

    fn throttle(&self) -> LocalResult<()> {
        let limit = self.config.rate_limit;
        if limit == 0 {
            return Ok(());
        }
        let mut window = self.window.lock();
        if window.0.elapsed() >= Duration::from_secs(1) {
            *window = (Instant::now(), 0);
        }
        if window.1 >= limit {
            return Err(LocalError::TooManyRequests);
        }
        window.1 += 1;
        Ok(())
    }
}
