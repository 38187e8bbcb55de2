//! Access grant and project lifecycle integration tests.

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use chrono::Utc;
    use uplink::{Config, ErrorKind, Permission, SharePrefix};
    use uplink_local::LocalConfig;

    use crate::{create_test_bucket, harness, harness_with, open_project, upload_bytes};

    #[test]
    fn test_should_parse_serialized_access() {
        let h = harness();
        let serialized = h.access().serialize().expect("serialize");

        let address = h
            .uplink
            .with_parsed_access(&serialized, |access| access.satellite_address())
            .expect("parse access");
        assert_eq!(address, h.config.satellite_address);
        assert!(h.is_clean());
    }

    #[test]
    fn test_should_reject_malformed_access() {
        let h = harness();
        let err = h
            .uplink
            .parse_access("definitely not an access grant")
            .expect_err("garbage must not parse");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_should_request_access_with_config() {
        let h = harness();
        let temp = tempfile::tempdir().expect("tempdir");
        let config = Config::builder()
            .user_agent(Some("integration/1.0".to_owned()))
            .dial_timeout(Duration::from_secs(5))
            .temp_directory(Some(temp.path().to_path_buf()))
            .build();

        let access = h
            .uplink
            .request_access_with_passphrase_and_config(
                &config,
                &h.config.satellite_address,
                h.api_key(),
                "pw",
            )
            .expect("request access with config");
        access
            .with_project_config(&config, |project| project.ensure_bucket("configured"))
            .expect("project with config");
    }

    #[test]
    fn test_should_fail_for_unknown_satellite() {
        let h = harness();
        let err = h
            .uplink
            .request_access_with_passphrase("1abc@127.0.0.1:1", h.api_key(), "pw")
            .expect_err("unknown satellite must fail");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
    }

    #[test]
    fn test_should_restrict_shared_access_to_prefix() {
        let h = harness();
        let access = h.access();
        let bucket = access
            .with_project(|project| Ok(create_test_bucket(project, "share")))
            .expect("setup");

        let shared = access
            .share(&Permission::full(), &[SharePrefix::new(&bucket, "foo/")])
            .expect("share");
        let project = open_project(&shared);

        upload_bytes(&project, &bucket, "foo/test.txt", b"allowed", 0, None)
            .expect("upload under the shared prefix");
        for key in ["test.txt", "bar/test.txt"] {
            let err = upload_bytes(&project, &bucket, key, b"denied", 0, None)
                .expect_err("upload outside the prefix must fail");
            assert_eq!(err.kind(), Some(ErrorKind::Internal), "{key}");
        }
    }

    #[test]
    fn test_should_keep_shared_access_independent_of_parent() {
        let h = harness();
        let parent = h.access();
        let bucket = parent
            .with_project(|project| Ok(create_test_bucket(project, "indep")))
            .expect("setup");
        let child = parent
            .share(&Permission::read_only(), &[SharePrefix::bucket(&bucket)])
            .expect("share");
        drop(parent);

        let project = open_project(&child);
        project.stat_bucket(&bucket).expect("child still works");
        let err = project
            .create_bucket("forbidden")
            .expect_err("read-only access must not create buckets");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
    }

    #[test]
    fn test_should_refuse_access_outside_validity_window() {
        let h = harness();
        let expired = Permission {
            not_after: Some(Utc::now() - chrono::Duration::hours(1)),
            ..Permission::full()
        };
        let shared = h.access().share(&expired, &[]).expect("share");
        let project = open_project(&shared);
        let err = project
            .ensure_bucket("late")
            .expect_err("expired permission must fail");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
    }

    #[test]
    fn test_should_observe_delayed_revocation() {
        let h = harness_with(LocalConfig::builder().revocation_delay_ms(250).build());
        let access = h.access();
        let shared = access.share(&Permission::full(), &[]).expect("share");

        access
            .with_project(|project| project.revoke_access(&shared))
            .expect("revoke");

        shared
            .with_project(|project| project.ensure_bucket("before-revoke"))
            .expect("revocation is not immediate");

        let deadline = Instant::now() + Duration::from_secs(5);
        let err = loop {
            match shared.with_project(|project| project.ensure_bucket("after-revoke")) {
                Err(e) => break e,
                Ok(_) => {
                    assert!(Instant::now() < deadline, "revocation never took effect");
                    thread::sleep(Duration::from_millis(10));
                }
            }
        };
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
        access
            .with_project(|project| project.stat_bucket("before-revoke"))
            .expect("the revoker keeps working");
    }

    #[test]
    fn test_should_refuse_to_revoke_root_access() {
        let h = harness();
        let access = h.access();
        let err = access
            .with_project(|project| project.revoke_access(&access))
            .expect_err("the root access cannot revoke itself");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
    }

    #[test]
    fn test_should_override_encryption_key() {
        let h = harness();
        let access = h.access();
        let key = h
            .uplink
            .derive_encryption_key("bucket secret", b"salt")
            .expect("derive key");
        access
            .override_encryption_key("vault", "secrets/", &key)
            .expect("override");
        let err = access
            .override_encryption_key("", "secrets/", &key)
            .expect_err("bucket is required");
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
    }

    #[test]
    fn test_should_track_leaked_manual_project() {
        let h = harness();
        let access = h.access();

        let closed = access.open_project_manual().expect("open manual");
        closed.close().expect("close");
        assert_eq!(h.peer.open_sessions(), 0);

        let leaked = access.open_project_manual().expect("open manual");
        drop(leaked);
        assert_eq!(h.peer.open_sessions(), 1);

        drop(access);
        assert!(h.is_clean());
    }
}
