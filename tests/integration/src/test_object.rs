//! Object upload, download and metadata integration tests.

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use chrono::{Duration, Utc};
    use uplink::{CustomMetadata, DownloadOptions, ErrorKind, UploadOptions};
    use uplink_local::LocalConfig;

    use crate::{
        create_test_bucket, download_bytes, harness, harness_with, md5_hex, open_project,
        random_payload, upload_bytes,
    };

    #[test]
    fn test_should_round_trip_hello_world() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "hello");

        upload_bytes(&project, &bucket, "hello.txt", b"hello world", 0, None).expect("upload");
        let object = project.stat_object(&bucket, "hello.txt").expect("stat");
        assert_eq!(object.key, "hello.txt");
        assert!(!object.is_prefix);
        assert_eq!(object.system.content_length, 11);
        assert!(object.system.created.is_some());
        assert!(object.system.expires.is_none());
        assert!(object.custom.is_empty());

        let data = download_bytes(&project, &bucket, "hello.txt", 4).expect("download");
        assert_eq!(data, b"hello world");

        let deleted = project.delete_object(&bucket, "hello.txt").expect("delete");
        assert_eq!(deleted.map(|o| o.key).as_deref(), Some("hello.txt"));
        let err = project
            .stat_object(&bucket, "hello.txt")
            .expect_err("stat after delete");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));
        assert!(
            project
                .delete_object(&bucket, "hello.txt")
                .expect("delete missing")
                .is_none()
        );
    }

    #[test]
    fn test_should_preserve_random_payload_across_chunk_sizes() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "random");
        let payload = random_payload(100 * 1024 + 7);
        let digest = md5_hex(&payload);

        for (i, (write_chunk, read_chunk)) in [(0, 1024), (4093, 777), (65_536, 3)]
            .into_iter()
            .enumerate()
        {
            let key = format!("payload-{i}");
            upload_bytes(&project, &bucket, &key, &payload, write_chunk, None).expect("upload");
            let back = download_bytes(&project, &bucket, &key, read_chunk).expect("download");
            assert_eq!(back.len(), payload.len());
            assert_eq!(md5_hex(&back), digest, "write {write_chunk} read {read_chunk}");
        }
    }

    #[test]
    fn test_should_download_partial_range() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "range");
        let payload = random_payload(10_000);
        upload_bytes(&project, &bucket, "blob", &payload, 0, None).expect("upload");

        for (offset, length) in [(0, 1), (123, 4567), (9_999, 1), (5_000, 5_000)] {
            let options = DownloadOptions::range(offset, length);
            let part = project
                .with_download(&bucket, "blob", Some(&options), |download| {
                    let mut data = Vec::new();
                    download.read_to_end(&mut data, 512)?;
                    Ok(data)
                })
                .expect("ranged download");
            let start = usize::try_from(offset).expect("offset");
            let end = start + usize::try_from(length).expect("length");
            assert_eq!(part, &payload[start..end], "range {offset}+{length}");
        }

        let tail = DownloadOptions {
            offset: 9_990,
            length: None,
        };
        let part = project
            .with_download(&bucket, "blob", Some(&tail), |download| {
                let mut data = Vec::new();
                download.read_to_end(&mut data, 4)?;
                Ok(data)
            })
            .expect("tail download");
        assert_eq!(part, &payload[9_990..]);
    }

    #[test]
    fn test_should_report_object_info_on_streams() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "info");

        let mut upload = project
            .upload_object(&bucket, "doc.txt", None)
            .expect("upload");
        upload.write_all(b"draft").expect("write");
        let pending = upload.info().expect("pending info");
        assert_eq!(pending.key, "doc.txt");
        assert_eq!(pending.system.content_length, 5);
        upload.commit().expect("commit");
        drop(upload);

        let download = project
            .download_object(&bucket, "doc.txt", None)
            .expect("download");
        let info = download.info().expect("download info");
        assert_eq!(info.system.content_length, 5);
        download.close().expect("close");
    }

    #[test]
    fn test_should_finish_upload_only_once() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "once");

        let mut committed = project.upload_object(&bucket, "a", None).expect("upload");
        committed.write_all(b"a").expect("write");
        committed.commit().expect("commit");
        let err = committed.commit().expect_err("second commit");
        assert_eq!(err.kind(), Some(ErrorKind::UploadDone));
        let err = committed.abort().expect_err("abort after commit");
        assert_eq!(err.kind(), Some(ErrorKind::UploadDone));
        drop(committed);

        let mut aborted = project.upload_object(&bucket, "b", None).expect("upload");
        aborted.write_all(b"b").expect("write");
        aborted.abort().expect("abort");
        let err = aborted.write(b"more").expect_err("write after abort");
        assert_eq!(err.kind(), Some(ErrorKind::UploadDone));
        drop(aborted);

        let err = project.stat_object(&bucket, "b").expect_err("aborted upload");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));
    }

    #[test]
    fn test_should_not_create_object_for_uncommitted_upload() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "uncommitted");

        project
            .with_upload(&bucket, "never", None, |upload| upload.write_all(b"lost"))
            .expect("scope without commit");
        let err = project
            .stat_object(&bucket, "never")
            .expect_err("nothing committed");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));
        assert_eq!(h.peer.storage_used(h.api_key()), Some(0));
    }

    #[test]
    fn test_should_store_and_replace_custom_metadata() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "meta");

        let mut custom = CustomMetadata::new();
        custom.insert("content-type", "text/plain");
        custom.insert("owner", "qa");
        upload_bytes(&project, &bucket, "note", b"note", 0, Some(&custom)).expect("upload");
        let object = project.stat_object(&bucket, "note").expect("stat");
        assert_eq!(object.custom, custom);

        let mut replacement = CustomMetadata::new();
        replacement.insert("reviewed", true);
        project
            .update_object_metadata(&bucket, "note", &replacement)
            .expect("update");
        let object = project.stat_object(&bucket, "note").expect("stat");
        assert_eq!(object.custom.get("reviewed"), Some("true"));
        assert!(object.custom.get("owner").is_none());
    }

    #[test]
    fn test_should_copy_and_move_objects() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let source = create_test_bucket(&project, "src");
        let target = create_test_bucket(&project, "dst");
        upload_bytes(&project, &source, "orig", b"payload", 0, None).expect("upload");

        let copy = project
            .copy_object(&source, "orig", &target, "copy")
            .expect("copy");
        assert_eq!(copy.key, "copy");
        assert_eq!(copy.system.content_length, 7);
        project.stat_object(&source, "orig").expect("source survives copy");

        project
            .move_object(&source, "orig", &target, "moved")
            .expect("move");
        let err = project.stat_object(&source, "orig").expect_err("source gone");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));
        let moved = download_bytes(&project, &target, "moved", 3).expect("download moved");
        assert_eq!(moved, b"payload");

        let err = project
            .copy_object(&source, "orig", &target, "again")
            .expect_err("copy of moved object");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));
    }

    #[test]
    fn test_should_hide_expired_objects() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "ttl");

        let future = UploadOptions {
            expires: Some(Utc::now() + Duration::hours(1)),
        };
        project
            .with_upload(&bucket, "fresh", Some(&future), |upload| {
                upload.write_all(b"fresh")?;
                upload.commit()
            })
            .expect("upload fresh");
        let object = project.stat_object(&bucket, "fresh").expect("stat fresh");
        assert_eq!(
            object.system.expires.map(|t| t.timestamp()),
            future.expires.map(|t| t.timestamp())
        );

        let past = UploadOptions {
            expires: Some(Utc::now() - Duration::seconds(5)),
        };
        project
            .with_upload(&bucket, "stale", Some(&past), |upload| {
                upload.write_all(b"stale")?;
                upload.commit()
            })
            .expect("upload stale");
        let err = project.stat_object(&bucket, "stale").expect_err("expired");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectNotFound));

        let keys: Vec<String> = project
            .list_objects(&bucket, None)
            .map(|o| o.map(|o| o.key))
            .collect::<uplink::Result<_>>()
            .expect("list");
        assert_eq!(keys, ["fresh"]);
    }

    #[test]
    fn test_should_stream_through_io_traits() {
        let h = harness_with(LocalConfig::builder().max_write_chunk(3).build());
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "io");

        let mut upload = project.upload_object(&bucket, "lines", None).expect("upload");
        for n in 0..3 {
            writeln!(upload, "line {n}").expect("writeln");
        }
        upload.flush().expect("flush");
        upload.commit().expect("commit");
        drop(upload);

        let mut download = project
            .download_object(&bucket, "lines", None)
            .expect("download");
        let mut text = String::new();
        download.read_to_string(&mut text).expect("read_to_string");
        assert_eq!(text, "line 0\nline 1\nline 2\n");
    }

    #[test]
    fn test_should_reject_empty_object_key() {
        let h = harness();
        let access = h.access();
        let project = open_project(&access);
        let bucket = create_test_bucket(&project, "keys");
        let err = project
            .upload_object(&bucket, "", None)
            .err()
            .expect("empty key");
        assert_eq!(err.kind(), Some(ErrorKind::ObjectKeyInvalid));
    }
}
