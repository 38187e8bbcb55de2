//! Bucket lifecycle integration tests.

#[cfg(test)]
mod tests {
    use uplink::{ErrorKind, ListBucketsOptions};

    use crate::{create_test_bucket, harness, open_project, upload_bytes};

    #[test]
    fn test_should_create_stat_and_delete_bucket() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let name = create_test_bucket(&project, "life");

        let stat = project.stat_bucket(&name).expect("stat");
        assert_eq!(stat.name, name);

        let err = project.create_bucket(&name).expect_err("duplicate create");
        assert_eq!(err.kind(), Some(ErrorKind::BucketAlreadyExists));

        let ensured = project.ensure_bucket(&name).expect("ensure existing");
        assert_eq!(ensured.created, stat.created);

        let deleted = project.delete_bucket(&name).expect("delete");
        assert_eq!(deleted.name, name);
        let err = project.stat_bucket(&name).expect_err("stat after delete");
        assert_eq!(err.kind(), Some(ErrorKind::BucketNotFound));
    }

    #[test]
    fn test_should_reject_invalid_bucket_name() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        for name in ["AB", "Upper-Case", "-leading", "192.168.1.1"] {
            let err = project.create_bucket(name).expect_err("invalid name");
            assert_eq!(err.kind(), Some(ErrorKind::BucketNameInvalid), "{name}");
        }
    }

    #[test]
    fn test_should_refuse_to_delete_non_empty_bucket() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let name = create_test_bucket(&project, "full");
        upload_bytes(&project, &name, "a.txt", b"a", 0, None).expect("upload");

        let err = project.delete_bucket(&name).expect_err("bucket has objects");
        assert_eq!(err.kind(), Some(ErrorKind::BucketNotEmpty));

        project.delete_bucket_with_objects(&name).expect("force delete");
        assert_eq!(
            project.stat_bucket(&name).map_err(|e| e.kind()).err(),
            Some(Some(ErrorKind::BucketNotFound))
        );
    }

    #[test]
    fn test_should_count_pending_upload_as_content() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let name = create_test_bucket(&project, "pending");
        let upload = project
            .begin_upload(&name, "big.bin", None)
            .expect("begin upload");

        let err = project.delete_bucket(&name).expect_err("pending upload");
        assert_eq!(err.kind(), Some(ErrorKind::BucketNotEmpty));

        project
            .abort_upload(&name, "big.bin", &upload.upload_id)
            .expect("abort");
        project.delete_bucket(&name).expect("delete once empty");
    }

    #[test]
    fn test_should_release_storage_when_deleting_with_objects() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let name = create_test_bucket(&project, "usage");
        upload_bytes(&project, &name, "one", &[0u8; 64], 0, None).expect("upload");
        let pending = project.begin_upload(&name, "two", None).expect("begin");
        project
            .upload_part(&name, "two", &pending.upload_id, 1)
            .and_then(|mut part| {
                part.write_all(&[1u8; 32])?;
                part.commit()
            })
            .expect("part");
        assert_eq!(h.peer.storage_used(h.api_key()), Some(96));

        project.delete_bucket_with_objects(&name).expect("delete");
        assert_eq!(h.peer.storage_used(h.api_key()), Some(0));
    }

    #[test]
    fn test_should_list_buckets_after_cursor() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        for name in ["alpha", "bravo", "charlie", "delta"] {
            project.create_bucket(name).expect("create");
        }

        let all: Vec<String> = project
            .list_buckets(None)
            .map(|b| b.map(|b| b.name))
            .collect::<uplink::Result<_>>()
            .expect("list");
        assert_eq!(all, ["alpha", "bravo", "charlie", "delta"]);

        let options = ListBucketsOptions {
            cursor: Some("bravo".to_owned()),
        };
        let rest: Vec<String> = project
            .list_buckets(Some(&options))
            .map(|b| b.map(|b| b.name))
            .collect::<uplink::Result<_>>()
            .expect("list after cursor");
        assert_eq!(rest, ["charlie", "delta"]);
    }

    #[test]
    fn test_should_list_only_shared_buckets() {
        let h = harness();
        let access = h.access();
        {
            let project = open_project(&access);
            project.create_bucket("visible").expect("create");
            project.create_bucket("hidden").expect("create");
        }
        let shared = access
            .share(
                &uplink::Permission::full(),
                &[uplink::SharePrefix::bucket("visible")],
            )
            .expect("share");
        let project = open_project(&shared);
        let names: Vec<String> = project
            .list_buckets(None)
            .map(|b| b.map(|b| b.name))
            .collect::<uplink::Result<_>>()
            .expect("list");
        assert_eq!(names, ["visible"]);
    }
}
