//! Listing integration tests: prefixes, cursors and metadata flags.

#[cfg(test)]
mod tests {
    use uplink::{CustomMetadata, ErrorKind, ListObjectsOptions, Object, Project};

    use crate::{create_test_bucket, harness, open_project, upload_bytes};

    fn keys(project: &Project, bucket: &str, options: &ListObjectsOptions) -> Vec<String> {
        project
            .list_objects(bucket, Some(options))
            .map(|o| o.map(|o| o.key))
            .collect::<uplink::Result<_>>()
            .expect("list objects")
    }

    fn seed(project: &Project, bucket: &str, keys: &[&str]) {
        let mut custom = CustomMetadata::new();
        custom.insert("seeded", true);
        for key in keys {
            upload_bytes(project, bucket, key, key.as_bytes(), 0, Some(&custom)).expect("seed");
        }
    }

    #[test]
    fn test_should_collapse_prefixes_unless_recursive() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "tree");
        seed(&project, &bucket, &["a.txt", "x/b.txt", "x/c.txt", "x/y/d.txt"]);

        let flat = keys(&project, &bucket, &ListObjectsOptions::default());
        assert_eq!(flat, ["a.txt", "x/"]);

        let prefixes: Vec<bool> = project
            .list_objects(&bucket, None)
            .map(|o| o.map(|o| o.is_prefix))
            .collect::<uplink::Result<_>>()
            .expect("list");
        assert_eq!(prefixes, [false, true]);

        let recursive = ListObjectsOptions {
            recursive: true,
            ..ListObjectsOptions::default()
        };
        assert_eq!(
            keys(&project, &bucket, &recursive),
            ["a.txt", "x/b.txt", "x/c.txt", "x/y/d.txt"]
        );

        let under_x = ListObjectsOptions {
            prefix: Some("x/".to_owned()),
            ..ListObjectsOptions::default()
        };
        assert_eq!(keys(&project, &bucket, &under_x), ["x/b.txt", "x/c.txt", "x/y/"]);
    }

    #[test]
    fn test_should_resume_listing_from_any_key() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "cursor");
        let all: Vec<String> = (0..8).map(|i| format!("obj-{i:02}")).collect();
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        seed(&project, &bucket, &refs);

        for k in 0..all.len() {
            let options = ListObjectsOptions {
                cursor: Some(all[k].clone()),
                recursive: true,
                ..ListObjectsOptions::default()
            };
            assert_eq!(keys(&project, &bucket, &options), all[k + 1..], "cursor {k}");
        }
    }

    #[test]
    fn test_should_include_metadata_only_when_requested() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "flags");
        seed(&project, &bucket, &["doc"]);

        let list_one = |options: &ListObjectsOptions| -> Object {
            let mut iter = project.list_objects(&bucket, Some(options));
            assert!(iter.advance());
            let object = iter.item().expect("item after advance");
            assert!(!iter.advance());
            assert!(iter.err().is_none());
            object
        };

        let bare = list_one(&ListObjectsOptions::default());
        assert_eq!(bare.key, "doc");
        assert_eq!(bare.system.content_length, 0);
        assert!(bare.system.created.is_none());
        assert!(bare.custom.is_empty());

        let full = list_one(&ListObjectsOptions {
            system: true,
            custom: true,
            ..ListObjectsOptions::default()
        });
        assert_eq!(full.system.content_length, 3);
        assert!(full.system.created.is_some());
        assert_eq!(full.custom.get("seeded"), Some("true"));
    }

    #[test]
    fn test_should_report_listing_failure_through_err() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);

        let mut missing = project.list_objects("no-such-bucket", None);
        assert!(!missing.advance());
        assert!(missing.item().is_none());
        assert_eq!(
            missing.err().and_then(|e| e.kind()),
            Some(ErrorKind::BucketNotFound)
        );
        assert!(!missing.advance());
        drop(missing);

        let bad = ListObjectsOptions {
            prefix: Some("nul\0prefix".to_owned()),
            ..ListObjectsOptions::default()
        };
        let results: Vec<uplink::Result<Object>> =
            project.list_objects("whatever", Some(&bad)).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results.first(),
            Some(Err(uplink::Error::InvalidArgument { .. }))
        ));
    }

    #[test]
    fn test_should_list_empty_bucket_cleanly() {
        let h = harness();
        let access = h.access();
        {
            let project = open_project(&access);
            let bucket = create_test_bucket(&project, "empty");
            let mut iter = project.list_objects(&bucket, None);
            assert!(!iter.advance());
            assert!(iter.err().is_none());
            assert_eq!(project.list_objects(&bucket, None).count(), 0);
        }
        drop(access);
        assert!(h.is_clean());
    }
}
