//! Bucket operation handlers.

use tracing::debug;
use uplink_sys::{ProjectHandle, RawBucket};

use crate::convert::now;
use crate::error::LocalResult;
use crate::grant::{Action, Request, Scope};
use crate::provider::LocalUplink;
use crate::validation::validate_bucket_name;

impl LocalUplink {
    pub(crate) fn handle_stat_bucket(
        &self,
        project: ProjectHandle,
        bucket: &str,
    ) -> LocalResult<RawBucket> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        session.authorize(&Request::new(Action::Read, "stat_bucket", Scope::Bucket(bucket)))?;
        Ok(session.project.get_bucket(bucket)?.to_raw())
    }

    pub(crate) fn handle_create_bucket(
        &self,
        project: ProjectHandle,
        bucket: &str,
    ) -> LocalResult<RawBucket> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        session.authorize(&Request::new(Action::Write, "create_bucket", Scope::Bucket(bucket)))?;
        let created = session.project.create_bucket(bucket, now())?;
        Ok(created.to_raw())
    }

    pub(crate) fn handle_ensure_bucket(
        &self,
        project: ProjectHandle,
        bucket: &str,
    ) -> LocalResult<RawBucket> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        session.authorize(&Request::new(Action::Write, "ensure_bucket", Scope::Bucket(bucket)))?;
        let ensured = session.project.ensure_bucket(bucket, now());
        debug!(bucket = %bucket, "ensure_bucket completed");
        Ok(ensured.to_raw())
    }

    pub(crate) fn handle_delete_bucket(
        &self,
        project: ProjectHandle,
        bucket: &str,
        with_objects: bool,
    ) -> LocalResult<RawBucket> {
        let session = self.universe.project(project)?;
        validate_bucket_name(bucket)?;
        session.authorize(&Request::new(Action::Delete, "delete_bucket", Scope::Bucket(bucket)))?;
        let deleted = session.project.delete_bucket(bucket, with_objects, now())?;
        Ok(deleted.to_raw())
    }
}
