//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use uplink::{
        CommitUploadOptions, CustomMetadata, ErrorKind, ListUploadPartsOptions, ListUploadsOptions,
        Project,
    };
    use uplink_local::LocalConfig;

    use crate::{
        create_test_bucket, download_bytes, harness_with, md5_hex, open_project, random_payload,
    };

    fn put_part(
        project: &Project,
        bucket: &str,
        key: &str,
        upload_id: &str,
        number: u32,
        data: &[u8],
    ) {
        let mut part = project
            .upload_part(bucket, key, upload_id, number)
            .expect("start part");
        part.write_all(data).expect("write part");
        part.set_etag(&format!("etag-{number}")).expect("etag");
        part.commit().expect("commit part");
        let info = part.info().expect("part info");
        assert_eq!(info.part_number, number);
        assert_eq!(info.size, data.len());
    }

    fn small_parts() -> LocalConfig {
        LocalConfig::builder().min_part_size(1024).build()
    }

    #[test]
    fn test_should_assemble_parts_in_number_order() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "mpu");

        let first = random_payload(1024);
        let second = random_payload(1024);
        let last = random_payload(100);
        let upload = project.begin_upload(&bucket, "joined", None).expect("begin");
        assert_eq!(upload.key, "joined");
        assert!(!upload.upload_id.is_empty());

        put_part(&project, &bucket, "joined", &upload.upload_id, 3, &last);
        put_part(&project, &bucket, "joined", &upload.upload_id, 1, &first);
        put_part(&project, &bucket, "joined", &upload.upload_id, 2, &second);

        let mut custom = CustomMetadata::new();
        custom.insert("parts", 3);
        let object = project
            .commit_upload(
                &bucket,
                "joined",
                &upload.upload_id,
                Some(&CommitUploadOptions {
                    custom_metadata: custom.clone(),
                }),
            )
            .expect("commit upload");
        assert_eq!(object.system.content_length, 2148);
        assert_eq!(object.custom, custom);

        let expected: Vec<u8> = [first, second, last].concat();
        let data = download_bytes(&project, &bucket, "joined", 999).expect("download");
        assert_eq!(md5_hex(&data), md5_hex(&expected));
    }

    #[test]
    fn test_should_fail_commit_for_undersized_part() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "small");
        let upload = project.begin_upload(&bucket, "tiny", None).expect("begin");

        put_part(&project, &bucket, "tiny", &upload.upload_id, 1, b"too small");
        put_part(&project, &bucket, "tiny", &upload.upload_id, 2, b"last part is exempt");

        let err = project
            .commit_upload(&bucket, "tiny", &upload.upload_id, None)
            .expect_err("undersized part");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));

        project
            .abort_upload(&bucket, "tiny", &upload.upload_id)
            .expect("abort still possible");
        assert_eq!(h.peer.storage_used(h.api_key()), Some(0));
    }

    #[test]
    fn test_should_fail_commit_without_parts() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "empty");
        let upload = project.begin_upload(&bucket, "nothing", None).expect("begin");

        let err = project
            .commit_upload(&bucket, "nothing", &upload.upload_id, None)
            .expect_err("no parts");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
    }

    #[test]
    fn test_should_forget_aborted_upload() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "abort");
        let upload = project.begin_upload(&bucket, "gone", None).expect("begin");
        put_part(&project, &bucket, "gone", &upload.upload_id, 1, b"data");

        project
            .abort_upload(&bucket, "gone", &upload.upload_id)
            .expect("abort");

        let err = project
            .commit_upload(&bucket, "gone", &upload.upload_id, None)
            .expect_err("commit after abort");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
        let err = project
            .upload_part(&bucket, "gone", &upload.upload_id, 2)
            .err()
            .expect("part after abort");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
        let err = project.stat_object(&bucket, "gone").expect_err("no object");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));
    }

    #[test]
    fn test_should_discard_aborted_part() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "partabort");
        let upload = project.begin_upload(&bucket, "obj", None).expect("begin");

        let mut part = project
            .upload_part(&bucket, "obj", &upload.upload_id, 1)
            .expect("start part");
        part.write_all(b"discarded").expect("write");
        part.abort().expect("abort part");
        let err = part.commit().expect_err("commit after abort");
        assert_eq!(err.kind(), Some(ErrorKind::UploadDone));
        drop(part);

        let parts: Vec<u32> = project
            .list_upload_parts(&bucket, "obj", &upload.upload_id, None)
            .map(|p| p.map(|p| p.part_number))
            .collect::<uplink::Result<_>>()
            .expect("list parts");
        assert!(parts.is_empty());
    }

    #[test]
    fn test_should_list_parts_after_cursor() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "parts");
        let upload = project.begin_upload(&bucket, "listed", None).expect("begin");
        for number in [5, 1, 3] {
            put_part(&project, &bucket, "listed", &upload.upload_id, number, b"part");
        }

        let all: Vec<(u32, String)> = project
            .list_upload_parts(&bucket, "listed", &upload.upload_id, None)
            .map(|p| p.map(|p| (p.part_number, p.etag)))
            .collect::<uplink::Result<_>>()
            .expect("list parts");
        assert_eq!(
            all,
            [
                (1, "etag-1".to_owned()),
                (3, "etag-3".to_owned()),
                (5, "etag-5".to_owned())
            ]
        );

        let after: Vec<u32> = project
            .list_upload_parts(
                &bucket,
                "listed",
                &upload.upload_id,
                Some(&ListUploadPartsOptions { cursor: 1 }),
            )
            .map(|p| p.map(|p| p.part_number))
            .collect::<uplink::Result<_>>()
            .expect("list after cursor");
        assert_eq!(after, [3, 5]);
    }

    #[test]
    fn test_should_list_pending_uploads() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "pending");
        let a = project.begin_upload(&bucket, "dir/a", None).expect("begin a");
        let b = project.begin_upload(&bucket, "dir/b", None).expect("begin b");
        project.begin_upload(&bucket, "top", None).expect("begin top");

        let top_level: Vec<(String, bool)> = project
            .list_uploads(&bucket, None)
            .map(|u| u.map(|u| (u.key, u.is_prefix)))
            .collect::<uplink::Result<_>>()
            .expect("list uploads");
        assert_eq!(
            top_level,
            [("dir/".to_owned(), true), ("top".to_owned(), false)]
        );

        let options = ListUploadsOptions {
            prefix: Some("dir/".to_owned()),
            system: true,
            ..ListUploadsOptions::default()
        };
        let mut ids: Vec<String> = project
            .list_uploads(&bucket, Some(&options))
            .map(|u| u.map(|u| u.upload_id))
            .collect::<uplink::Result<_>>()
            .expect("list under prefix");
        ids.sort();
        let mut expected = vec![a.upload_id, b.upload_id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_should_reject_unknown_upload_id() {
        let h = harness_with(small_parts());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "unknown");

        let err = project
            .abort_upload(&bucket, "key", "no-such-upload")
            .expect_err("unknown upload");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));

        let mut parts = project.list_upload_parts(&bucket, "key", "no-such-upload", None);
        assert!(!parts.advance());
        assert_eq!(parts.err().and_then(|e| e.kind()), Some(ErrorKind::Internal));
    }
}
