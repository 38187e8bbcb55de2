//! Upload, part upload, and download stream state machines.
//!
//! Uploads and part uploads are `open -> {write}* -> commit | abort`. Any
//! call after commit or abort fails with [`LocalError::UploadDone`].
//! Written bytes are reserved against the project storage limit as they
//! arrive and given back on abort or when the stream is dropped.
//!
//! Downloads serve a byte range snapshot and report the end of the stream
//! on the first read that finds nothing left.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, trace};
use uplink_sys::{RawObject, RawPart, RawSystemMetadata};

use crate::convert::{cstring, custom_to_raw, now};
use crate::error::{LocalError, LocalResult};
use crate::grant::{Action, Request, Scope};
use crate::session::Session;
use crate::state::{StoredObject, StoredPart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Committed,
    Aborted,
}

/// Buffer shared by upload and part upload streams.
#[derive(Debug)]
struct WriteBuffer {
    session: Arc<Session>,
    data: BytesMut,
    phase: Phase,
    reserved: u64,
}

impl WriteBuffer {
    fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            data: BytesMut::new(),
            phase: Phase::Open,
            reserved: 0,
        }
    }

    fn ensure_open(&self) -> LocalResult<()> {
        if self.phase == Phase::Open {
            Ok(())
        } else {
            Err(LocalError::UploadDone)
        }
    }

    fn write(&mut self, bytes: &[u8]) -> LocalResult<usize> {
        self.ensure_open()?;
        if self.session.is_closed() {
            return Err(LocalError::ProjectClosed);
        }
        let n = bytes.len().min(self.session.config.max_write_chunk.max(1));
        if n == 0 {
            return Ok(0);
        }
        self.session
            .project
            .reserve_storage(n as u64, self.session.config.storage_limit)?;
        self.reserved += n as u64;
        self.data.extend_from_slice(&bytes[..n]);
        trace!(accepted = n, offered = bytes.len(), "stream write");
        Ok(n)
    }

    /// Hand the buffered bytes over; the reservation moves with them.
    fn take(&mut self, phase: Phase) -> Bytes {
        self.phase = phase;
        self.reserved = 0;
        std::mem::take(&mut self.data).freeze()
    }

    fn abort(&mut self) -> LocalResult<()> {
        self.ensure_open()?;
        self.session.project.release_storage(self.reserved);
        self.reserved = 0;
        self.data.clear();
        self.phase = Phase::Aborted;
        Ok(())
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

impl Drop for WriteBuffer {
    fn drop(&mut self) {
        if self.reserved > 0 {
            self.session.project.release_storage(self.reserved);
        }
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// An object upload stream.
#[derive(Debug)]
pub(crate) struct UploadStream {
    buffer: WriteBuffer,
    bucket: String,
    key: String,
    created: i64,
    expires: i64,
    custom: BTreeMap<String, String>,
    committed: Option<StoredObject>,
}

impl UploadStream {
    pub(crate) fn new(session: Arc<Session>, bucket: String, key: String, expires: i64) -> Self {
        Self {
            buffer: WriteBuffer::new(session),
            bucket,
            key,
            created: now(),
            expires,
            custom: BTreeMap::new(),
            committed: None,
        }
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> LocalResult<usize> {
        self.buffer.write(bytes)
    }

    pub(crate) fn set_custom(&mut self, custom: BTreeMap<String, String>) -> LocalResult<()> {
        self.buffer.ensure_open()?;
        self.custom = custom;
        Ok(())
    }

    pub(crate) fn commit(&mut self) -> LocalResult<()> {
        self.buffer.ensure_open()?;
        let session = Arc::clone(&self.buffer.session);
        session.authorize(&Request::new(
            Action::Write,
            "upload_commit",
            Scope::Object(&self.bucket, &self.key),
        ))?;
        let bucket = session.project.get_bucket(&self.bucket)?;
        session
            .project
            .reserve_segments(1, session.config.segment_limit)?;

        let object = StoredObject {
            key: self.key.clone(),
            created: now(),
            expires: self.expires,
            data: self.buffer.take(Phase::Committed),
            custom: std::mem::take(&mut self.custom),
            segments: 1,
        };
        if let Some(old) = bucket.put_object(object.clone()) {
            session.project.release_object(old.size(), old.segments);
        }
        info!(bucket = %self.bucket, key = %self.key, size = object.size(), "upload committed");
        self.committed = Some(object);
        Ok(())
    }

    pub(crate) fn abort(&mut self) -> LocalResult<()> {
        self.buffer.abort()?;
        debug!(bucket = %self.bucket, key = %self.key, "upload aborted");
        Ok(())
    }

    pub(crate) fn info(&self) -> RawObject {
        if let Some(object) = &self.committed {
            return object.to_raw(true, true);
        }
        RawObject {
            key: cstring(&self.key),
            is_prefix: false,
            system: RawSystemMetadata {
                created: self.created,
                expires: self.expires,
                content_length: i64::try_from(self.buffer.len()).unwrap_or(i64::MAX),
            },
            custom: custom_to_raw(&self.custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Part upload
// ---------------------------------------------------------------------------

/// A single part of a multipart upload.
#[derive(Debug)]
pub(crate) struct PartStream {
    buffer: WriteBuffer,
    bucket: String,
    key: String,
    upload_id: String,
    part_number: u32,
    etag: String,
    modified: i64,
    committed_size: usize,
}

impl PartStream {
    pub(crate) fn new(
        session: Arc<Session>,
        bucket: String,
        key: String,
        upload_id: String,
        part_number: u32,
    ) -> Self {
        Self {
            buffer: WriteBuffer::new(session),
            bucket,
            key,
            upload_id,
            part_number,
            etag: String::new(),
            modified: now(),
            committed_size: 0,
        }
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> LocalResult<usize> {
        let n = self.buffer.write(bytes)?;
        self.modified = now();
        Ok(n)
    }

    pub(crate) fn set_etag(&mut self, etag: &str) -> LocalResult<()> {
        self.buffer.ensure_open()?;
        etag.clone_into(&mut self.etag);
        Ok(())
    }

    pub(crate) fn commit(&mut self) -> LocalResult<()> {
        self.buffer.ensure_open()?;
        let session = Arc::clone(&self.buffer.session);
        session.authorize(&Request::new(
            Action::Write,
            "part_commit",
            Scope::Object(&self.bucket, &self.key),
        ))?;
        let bucket = session.project.get_bucket(&self.bucket)?;

        let size = self.buffer.len();
        let modified = now();
        let (part_number, etag) = (self.part_number, self.etag.clone());
        let buffer = &mut self.buffer;
        let replaced = bucket
            .with_upload(&self.upload_id, &self.key, |upload| {
                let part = StoredPart {
                    part_number,
                    data: buffer.take(Phase::Committed),
                    etag,
                    modified,
                };
                upload.parts.insert(part_number, part)
            })
            .ok_or_else(|| LocalError::UploadNotFound {
                upload_id: self.upload_id.clone(),
            })?;
        if let Some(old) = replaced {
            session.project.release_storage(old.size());
        }

        self.modified = modified;
        self.committed_size = size;
        debug!(
            bucket = %self.bucket,
            key = %self.key,
            part_number = self.part_number,
            size,
            "part committed"
        );
        Ok(())
    }

    pub(crate) fn abort(&mut self) -> LocalResult<()> {
        self.buffer.abort()?;
        debug!(key = %self.key, part_number = self.part_number, "part aborted");
        Ok(())
    }

    pub(crate) fn info(&self) -> RawPart {
        let size = if self.buffer.phase == Phase::Committed {
            self.committed_size
        } else {
            self.buffer.len()
        };
        RawPart {
            part_number: self.part_number,
            size,
            modified: self.modified,
            etag: cstring(&self.etag),
        }
    }
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

/// Outcome of one download read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadChunk {
    pub bytes_read: usize,
    pub eof: bool,
}

/// An object download stream.
#[derive(Debug)]
pub(crate) struct DownloadStream {
    session: Arc<Session>,
    info: RawObject,
    data: Bytes,
    position: usize,
    stalls_left: usize,
    closed: bool,
}

impl DownloadStream {
    pub(crate) fn new(
        session: Arc<Session>,
        object: &StoredObject,
        offset: i64,
        length: i64,
    ) -> LocalResult<Self> {
        let size = object.size();
        let start = u64::try_from(offset).map_err(|_| LocalError::InvalidRange { offset, size })?;
        if start > size {
            return Err(LocalError::InvalidRange { offset, size });
        }
        let end = match u64::try_from(length) {
            Ok(len) => start.saturating_add(len).min(size),
            Err(_) => size,
        };
        let session_stalls = session.config.stalled_reads;
        let first = usize::try_from(start).unwrap_or(usize::MAX);
        let last = usize::try_from(end).unwrap_or(usize::MAX);
        Ok(Self {
            session,
            info: object.to_raw(true, true),
            data: object.data.slice(first..last),
            position: 0,
            stalls_left: session_stalls,
            closed: false,
        })
    }

    pub(crate) fn read(&mut self, buffer: &mut [u8]) -> LocalResult<ReadChunk> {
        if self.closed {
            return Err(LocalError::DownloadClosed);
        }
        if self.session.is_closed() {
            return Err(LocalError::ProjectClosed);
        }
        let remaining = self.data.len() - self.position;
        if remaining == 0 {
            return Ok(ReadChunk {
                bytes_read: 0,
                eof: true,
            });
        }
        if self.stalls_left > 0 && !buffer.is_empty() {
            self.stalls_left -= 1;
            trace!(stalls_left = self.stalls_left, "download read stalled");
            return Ok(ReadChunk {
                bytes_read: 0,
                eof: false,
            });
        }
        let n = buffer
            .len()
            .min(remaining)
            .min(self.session.config.max_read_chunk.max(1));
        if n > 0 {
            self.session
                .project
                .charge_bandwidth(n as u64, self.session.config.bandwidth_limit)?;
            buffer[..n].copy_from_slice(&self.data[self.position..self.position + n]);
            self.position += n;
        }
        trace!(bytes_read = n, remaining = remaining - n, "download read");
        Ok(ReadChunk {
            bytes_read: n,
            eof: false,
        })
    }

    pub(crate) fn info(&self) -> RawObject {
        self.info.clone()
    }

    pub(crate) fn close(&mut self) -> LocalResult<()> {
        if self.closed {
            return Err(LocalError::DownloadClosed);
        }
        self.closed = true;
        Ok(())
    }
}
