//! Error reporting integration tests.

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use uplink::{Error, ErrorKind};
    use uplink_local::LocalConfig;
    use uplink_sys::{Boundary, ProjectHandle, Release, codes};

    use crate::{
        create_test_bucket, download_bytes, harness, harness_with, open_project, upload_bytes,
    };

    #[test]
    fn test_should_classify_every_reserved_code() {
        let table = [
            (codes::ERROR_INTERNAL, ErrorKind::Internal),
            (codes::ERROR_CANCELED, ErrorKind::Canceled),
            (codes::ERROR_INVALID_HANDLE, ErrorKind::InvalidHandle),
            (codes::ERROR_TOO_MANY_REQUESTS, ErrorKind::TooManyRequests),
            (codes::ERROR_BANDWIDTH_LIMIT_EXCEEDED, ErrorKind::BandwidthLimitExceeded),
            (codes::ERROR_STORAGE_LIMIT_EXCEEDED, ErrorKind::StorageLimitExceeded),
            (codes::ERROR_SEGMENTS_LIMIT_EXCEEDED, ErrorKind::SegmentsLimitExceeded),
            (codes::ERROR_BUCKET_NAME_INVALID, ErrorKind::BucketNameInvalid),
            (codes::ERROR_BUCKET_ALREADY_EXISTS, ErrorKind::BucketAlreadyExists),
            (codes::ERROR_BUCKET_NOT_EMPTY, ErrorKind::BucketNotEmpty),
            (codes::ERROR_BUCKET_NOT_FOUND, ErrorKind::BucketNotFound),
            (codes::ERROR_OBJECT_KEY_INVALID, ErrorKind::ObjectKeyInvalid),
            (codes::ERROR_OBJECT_NOT_FOUND, ErrorKind::ObjectNotFound),
            (codes::ERROR_UPLOAD_DONE, ErrorKind::UploadDone),
            (codes::EDGE_ERROR_AUTH_DIAL_FAILED, ErrorKind::EdgeAuthDialFailed),
            (codes::EDGE_ERROR_REGISTER_ACCESS_FAILED, ErrorKind::EdgeRegisterAccessFailed),
        ];
        for (code, kind) in table {
            assert_eq!(ErrorKind::from_code(code), kind, "{code:#x}");
            assert_eq!(kind.code(), code);
        }
        assert_eq!(ErrorKind::from_code(0x7f), ErrorKind::Internal);
    }

    #[test]
    fn test_should_keep_peer_message_and_code() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);

        let err = project.stat_bucket("missing-bucket").expect_err("missing");
        assert_eq!(err.code(), Some(codes::ERROR_BUCKET_NOT_FOUND));
        assert_eq!(err.to_string(), "uplink: bucket not found (\"missing-bucket\")");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_should_report_invalid_handle_from_boundary() {
        let h = harness();
        let bogus = ProjectHandle::from_raw(0xdead);
        let result = h.peer.stat_bucket(bogus, c"bucket");
        let err = result.error.as_ref().map(Error::from_raw).expect("error set");
        assert!(result.value.is_none());
        assert_eq!(err.kind(), Some(ErrorKind::InvalidHandle));
        result.release(&*h.peer);
        assert!(h.is_clean());
    }

    #[test]
    fn test_should_reject_nul_bytes_before_calling_peer() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);

        let err = project.stat_bucket("bad\0name").expect_err("nul");
        assert!(matches!(err, Error::InvalidArgument { argument: "bucket", .. }));
        assert_eq!(err.kind(), None);
        assert_eq!(err.code(), None);

        let err = project
            .stat_object("bucket", "key\0tail")
            .expect_err("nul in key");
        assert!(matches!(err, Error::InvalidArgument { argument: "key", .. }));

        let err = h
            .uplink
            .request_access_with_passphrase("sat\0", h.api_key(), "pw")
            .expect_err("nul in address");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_should_throttle_and_recover() {
        let h = harness_with(LocalConfig::builder().rate_limit(3).build());
        let access = h.access();
        let project = open_project(&access);
        let bucket = "throttled";

        project.create_bucket(bucket).expect("first request");
        project.stat_bucket(bucket).expect("second request");
        project.stat_bucket(bucket).expect("third request");
        let err = project.stat_bucket(bucket).expect_err("over the limit");
        assert_eq!(err.kind(), Some(ErrorKind::TooManyRequests));
        assert!(err.is_retryable());

        thread::sleep(Duration::from_millis(1100));
        project.stat_bucket(bucket).expect("after the window");
    }

    #[test]
    fn test_should_enforce_storage_limit() {
        let h = harness_with(LocalConfig::builder().storage_limit(8).build());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "storage");

        let err = upload_bytes(&project, &bucket, "big", b"hello world", 0, None)
            .expect_err("over storage limit");
        assert_eq!(err.kind(), Some(ErrorKind::StorageLimitExceeded));
        assert_eq!(h.peer.storage_used(h.api_key()), Some(0));

        upload_bytes(&project, &bucket, "fits", b"12345678", 0, None).expect("within limit");
        assert_eq!(h.peer.storage_used(h.api_key()), Some(8));
    }

    #[test]
    fn test_should_enforce_bandwidth_limit() {
        let h = harness_with(LocalConfig::builder().bandwidth_limit(8).build());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "egress");
        upload_bytes(&project, &bucket, "obj", b"hello world", 0, None).expect("upload");

        let err = download_bytes(&project, &bucket, "obj", 4).expect_err("over bandwidth");
        assert_eq!(err.kind(), Some(ErrorKind::BandwidthLimitExceeded));
    }

    #[test]
    fn test_should_enforce_segment_limit() {
        let h = harness_with(LocalConfig::builder().segment_limit(1).build());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "segments");
        upload_bytes(&project, &bucket, "one", b"1", 0, None).expect("first segment");

        let err = upload_bytes(&project, &bucket, "two", b"2", 0, None)
            .expect_err("second segment");
        assert_eq!(err.kind(), Some(ErrorKind::SegmentsLimitExceeded));

        project.delete_object(&bucket, "one").expect("delete");
        upload_bytes(&project, &bucket, "two", b"2", 0, None).expect("segment freed");
    }

    #[test]
    fn test_should_surface_errors_through_io_traits() {
        let h = harness_with(LocalConfig::builder().storage_limit(2).build());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "iotrait");

        let mut upload = project
            .upload_object(&bucket, "obj", None)
            .expect("upload");
        let err = std::io::Write::write_all(&mut upload, b"too long").expect_err("io error");
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
        assert!(err.to_string().contains("storage limit exceeded"));
    }
}
