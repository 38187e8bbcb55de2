//! One project driven from many threads.

#[cfg(test)]
mod tests {
    use std::thread;

    use uplink::ListObjectsOptions;

    use crate::{
        create_test_bucket, download_bytes, harness, md5_hex, open_project, random_payload,
        upload_bytes,
    };

    #[test]
    fn test_should_share_project_across_threads() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "threads");

        thread::scope(|scope| {
            for worker in 0..8 {
                let (project, bucket) = (&project, &bucket);
                scope.spawn(move || {
                    for round in 0..4 {
                        let key = format!("w{worker}/r{round}");
                        let payload = random_payload(4096 + worker * 31 + round);
                        upload_bytes(project, bucket, &key, &payload, 1000, None)
                            .expect("upload");
                        let back = download_bytes(project, bucket, &key, 700).expect("download");
                        assert_eq!(md5_hex(&back), md5_hex(&payload), "{key}");
                    }
                });
            }
        });

        let options = ListObjectsOptions {
            recursive: true,
            ..ListObjectsOptions::default()
        };
        let count = project
            .list_objects(&bucket, Some(&options))
            .collect::<uplink::Result<Vec<_>>>()
            .expect("list")
            .len();
        assert_eq!(count, 32);

        drop(project);
        drop(access);
        assert!(h.is_clean());
        assert_eq!(h.peer.open_sessions(), 0);
    }

    #[test]
    fn test_should_keep_parallel_listings_independent() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "listings");
        for i in 0..20 {
            upload_bytes(&project, &bucket, &format!("k{i:02}"), b"x", 0, None).expect("seed");
        }

        thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        project
                            .list_objects(&bucket, None)
                            .map(|o| o.map(|o| o.key))
                            .collect::<uplink::Result<Vec<_>>>()
                            .expect("list")
                    })
                })
                .collect();
            for handle in handles {
                let keys = handle.join().expect("listing thread");
                assert_eq!(keys.len(), 20);
                assert_eq!(keys.first().map(String::as_str), Some("k00"));
            }
        });
    }
}
