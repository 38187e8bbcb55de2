//! Edge gateway registration and share URL integration tests.

#[cfg(test)]
mod tests {
    use uplink::{
        EdgeConfig, ErrorKind, Permission, RegisterAccessOptions, SharePrefix, ShareUrlOptions,
    };

    use crate::{create_test_bucket, harness, open_project};

    #[test]
    fn test_should_register_shared_access_and_build_links() {
        let h = harness();
        let access = h.access();
        let bucket = {
            let project = open_project(&access);
            create_test_bucket(&project, "public")
        };
        let public = access
            .share(&Permission::read_only(), &[SharePrefix::new(&bucket, "pics/")])
            .expect("share");

        let credential = public
            .edge_register_access(
                &EdgeConfig::new(h.config.auth_service_address.clone()),
                &RegisterAccessOptions { is_public: true },
            )
            .expect("register");
        assert_eq!(credential.endpoint, h.config.gateway_endpoint);
        assert!(!credential.access_key_id.is_empty());
        assert!(!credential.secret_key.is_empty());

        let again = public
            .edge_register_access(
                &EdgeConfig::new(h.config.auth_service_address.clone()),
                &RegisterAccessOptions::default(),
            )
            .expect("register again");
        assert_ne!(again.access_key_id, credential.access_key_id);

        let link = credential
            .join_share_url(
                "https://link.example.test",
                &bucket,
                Some("pics/summer 2024.png"),
                &ShareUrlOptions::default(),
            )
            .expect("landing link");
        assert_eq!(
            link,
            format!(
                "https://link.example.test/s/{}/{bucket}/pics/summer%202024.png",
                credential.access_key_id
            )
        );

        let raw = credential
            .join_share_url(
                "https://link.example.test",
                &bucket,
                Some("pics/a.png"),
                &ShareUrlOptions { raw: true },
            )
            .expect("raw link");
        assert!(raw.contains("/raw/"));
        drop((credential, again, public, access));
        assert!(h.is_clean());
    }

    #[test]
    fn test_should_report_unreachable_auth_service() {
        let h = harness();
        let access = h.access();
        let mut config = EdgeConfig::new("127.0.0.1:1");
        config.insecure_unencrypted_connection = true;
        let err = access
            .edge_register_access(&config, &RegisterAccessOptions::default())
            .expect_err("no auth service there");
        assert_eq!(err.kind(), Some(ErrorKind::EdgeAuthDialFailed));
        assert!(!err.is_retryable());
    }
}
