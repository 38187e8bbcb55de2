//! Object operations.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uplink_sys::{ObjectIteration, RawListObjectsOptions, RawObject};

use crate::error::Result;
use crate::guard;
use crate::iterator::ListIter;
use crate::marshal::{cstring, opt_cstring, string};
use crate::metadata::{CustomMetadata, SystemMetadata};
use crate::project::Project;

/// An object, or a shared key prefix in a non-recursive listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    /// Full key, or the prefix ending in `/` when `is_prefix`.
    pub key: String,
    /// Whether this entry groups keys under a common prefix.
    pub is_prefix: bool,
    /// Zeroed when a listing did not ask for it.
    pub system: SystemMetadata,
    /// Empty when a listing did not ask for it.
    pub custom: CustomMetadata,
}

impl Object {
    pub(crate) fn from_raw(raw: &RawObject) -> Self {
        Self {
            key: string(&raw.key),
            is_prefix: raw.is_prefix,
            system: SystemMetadata::from_raw(&raw.system),
            custom: CustomMetadata::from_raw(&raw.custom),
        }
    }
}

/// Options for [`Project::list_objects`] and [`Project::list_uploads`].
///
/// [`Project::list_uploads`]: crate::Project::list_uploads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjectsOptions {
    /// Only keys under this prefix. It should end in `/`.
    pub prefix: Option<String>,
    /// Start after this key.
    pub cursor: Option<String>,
    /// List every key instead of grouping by `/`.
    pub recursive: bool,
    /// Include system metadata.
    pub system: bool,
    /// Include custom metadata.
    pub custom: bool,
}

impl ListObjectsOptions {
    pub(crate) fn to_raw(&self) -> Result<RawListObjectsOptions> {
        Ok(RawListObjectsOptions {
            prefix: opt_cstring("prefix", self.prefix.as_deref())?,
            cursor: opt_cstring("cursor", self.cursor.as_deref())?,
            recursive: self.recursive,
            system: self.system,
            custom: self.custom,
        })
    }
}

/// Objects and prefixes in key order.
pub type ObjectIterator<'p> = ListIter<'p, ObjectIteration>;

impl Project {
    /// Look up an object.
    pub fn stat_object(&self, bucket: &str, key: &str) -> Result<Object> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let result = self.boundary().stat_object(self.handle(), &bucket_c, &key_c);
        guard::value(self.boundary(), result, "stat_object", Object::from_raw)
    }

    /// Delete an object, returning it. Deleting a missing key succeeds
    /// with `None`.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<Option<Object>> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let result = self
            .boundary()
            .delete_object(self.handle(), &bucket_c, &key_c);
        let deleted = guard::optional(self.boundary(), result, Object::from_raw)?;
        debug!(bucket, key, existed = deleted.is_some(), "object deleted");
        Ok(deleted)
    }

    /// Replace the whole custom metadata of an object.
    pub fn update_object_metadata(
        &self,
        bucket: &str,
        key: &str,
        metadata: &CustomMetadata,
    ) -> Result<()> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let error = self.boundary().update_object_metadata(
            self.handle(),
            &bucket_c,
            &key_c,
            &metadata.to_raw(),
        );
        guard::status(self.boundary(), error)?;
        debug!(bucket, key, entries = metadata.len(), "object metadata updated");
        Ok(())
    }

    /// Copy an object, returning the new one.
    pub fn copy_object(
        &self,
        bucket: &str,
        key: &str,
        new_bucket: &str,
        new_key: &str,
    ) -> Result<Object> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let new_bucket_c = cstring("new_bucket", new_bucket)?;
        let new_key_c = cstring("new_key", new_key)?;
        let result = self.boundary().copy_object(
            self.handle(),
            &bucket_c,
            &key_c,
            &new_bucket_c,
            &new_key_c,
        );
        let copied = guard::value(self.boundary(), result, "copy_object", Object::from_raw)?;
        info!(bucket, key, new_bucket, new_key, "object copied");
        Ok(copied)
    }

    /// Move an object to a new bucket or key.
    pub fn move_object(
        &self,
        bucket: &str,
        key: &str,
        new_bucket: &str,
        new_key: &str,
    ) -> Result<()> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let new_bucket_c = cstring("new_bucket", new_bucket)?;
        let new_key_c = cstring("new_key", new_key)?;
        let error = self.boundary().move_object(
            self.handle(),
            &bucket_c,
            &key_c,
            &new_bucket_c,
            &new_key_c,
        );
        guard::status(self.boundary(), error)?;
        info!(bucket, key, new_bucket, new_key, "object moved");
        Ok(())
    }

    /// List the objects of a bucket lazily.
    pub fn list_objects(
        &self,
        bucket: &str,
        options: Option<&ListObjectsOptions>,
    ) -> ObjectIterator<'_> {
        let prepared = cstring("bucket", bucket).and_then(|bucket_c| {
            let raw = options.map(ListObjectsOptions::to_raw).transpose()?;
            Ok((bucket_c, raw))
        });
        match prepared {
            Ok((bucket_c, raw)) => {
                let handle =
                    self.boundary()
                        .list_objects(self.handle(), &bucket_c, raw.as_ref());
                ListIter::new(self, handle)
            }
            Err(e) => ListIter::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uplink_local::{LocalConfig, LocalUplink};

    use super::*;
    use crate::{ErrorKind, Uplink};

    fn with_project(f: impl FnOnce(&Project)) {
        let config = LocalConfig::default();
        let uplink = Uplink::new(Arc::new(LocalUplink::new(config.clone())));
        let access = uplink
            .request_access_with_passphrase(&config.satellite_address, &config.api_keys[0], "pw")
            .unwrap_or_else(|e| panic!("request access: {e}"));
        let project = access
            .open_project()
            .unwrap_or_else(|e| panic!("open: {e}"));
        project
            .create_bucket("objects")
            .unwrap_or_else(|e| panic!("create bucket: {e}"));
        f(&project);
        drop(project);
        drop(access);
        assert!(uplink.internal_universe_is_empty());
    }

    fn put(project: &Project, key: &str, data: &[u8]) {
        project
            .with_upload("objects", key, None, |upload| {
                upload.write_all(data)?;
                upload.commit()
            })
            .unwrap_or_else(|e| panic!("upload {key}: {e}"));
    }

    #[test]
    fn test_should_stat_uploaded_object() {
        with_project(|project| {
            put(project, "foo/test.txt", b"hello world");
            let object = project
                .stat_object("objects", "foo/test.txt")
                .unwrap_or_else(|e| panic!("stat: {e}"));
            assert_eq!(object.key, "foo/test.txt");
            assert!(!object.is_prefix);
            assert_eq!(object.system.content_length, 11);
            assert!(object.custom.is_empty());
        });
    }

    #[test]
    fn test_should_delete_missing_object_as_none() {
        with_project(|project| {
            put(project, "gone.txt", b"x");
            let deleted = project
                .delete_object("objects", "gone.txt")
                .unwrap_or_else(|e| panic!("delete: {e}"));
            assert_eq!(deleted.map(|o| o.key).as_deref(), Some("gone.txt"));

            let again = project
                .delete_object("objects", "gone.txt")
                .unwrap_or_else(|e| panic!("delete again: {e}"));
            assert!(again.is_none());

            let err = project
                .stat_object("objects", "gone.txt")
                .err()
                .unwrap_or_else(|| panic!("deleted object must be gone"));
            assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));
        });
    }

    #[test]
    fn test_should_replace_custom_metadata() {
        with_project(|project| {
            put(project, "meta.txt", b"data");
            let metadata: CustomMetadata = [("color", "blue"), ("size", "big")]
                .into_iter()
                .collect();
            project
                .update_object_metadata("objects", "meta.txt", &metadata)
                .unwrap_or_else(|e| panic!("update: {e}"));
            let replacement: CustomMetadata = [("shape", "round")].into_iter().collect();
            project
                .update_object_metadata("objects", "meta.txt", &replacement)
                .unwrap_or_else(|e| panic!("update again: {e}"));

            let object = project
                .stat_object("objects", "meta.txt")
                .unwrap_or_else(|e| panic!("stat: {e}"));
            assert_eq!(object.custom, replacement);
        });
    }

    #[test]
    fn test_should_copy_then_move_object() {
        with_project(|project| {
            put(project, "src.txt", b"payload");
            let copy = project
                .copy_object("objects", "src.txt", "objects", "copy.txt")
                .unwrap_or_else(|e| panic!("copy: {e}"));
            assert_eq!(copy.key, "copy.txt");

            project
                .move_object("objects", "copy.txt", "objects", "moved.txt")
                .unwrap_or_else(|e| panic!("move: {e}"));
            assert!(project.stat_object("objects", "copy.txt").is_err());
            let moved = project
                .stat_object("objects", "moved.txt")
                .unwrap_or_else(|e| panic!("stat moved: {e}"));
            assert_eq!(moved.system.content_length, 7);
        });
    }

    #[test]
    fn test_should_group_keys_by_prefix() {
        with_project(|project| {
            for key in ["a.txt", "x/b.txt", "x/c.txt"] {
                put(project, key, b"1");
            }
            let flat: Vec<(String, bool)> = project
                .list_objects("objects", None)
                .map(|o| o.map(|o| (o.key, o.is_prefix)))
                .collect::<Result<_>>()
                .unwrap_or_else(|e| panic!("list: {e}"));
            assert_eq!(
                flat,
                vec![("a.txt".to_owned(), false), ("x/".to_owned(), true)]
            );

            let options = ListObjectsOptions {
                recursive: true,
                ..ListObjectsOptions::default()
            };
            let keys: Vec<String> = project
                .list_objects("objects", Some(&options))
                .map(|o| o.map(|o| o.key))
                .collect::<Result<_>>()
                .unwrap_or_else(|e| panic!("list recursive: {e}"));
            assert_eq!(keys, vec!["a.txt", "x/b.txt", "x/c.txt"]);
        });
    }

    #[test]
    fn test_should_defer_marshalling_error_to_listing() {
        with_project(|project| {
            let mut iter = project.list_objects("objects\0", None);
            assert!(!iter.advance());
            assert!(iter.err().is_some_and(|e| e.kind().is_none()));
        });
    }
}
