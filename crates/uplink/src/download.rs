//! Streaming object downloads.
//!
//! End of stream arrives as the reserved error code `-1`. It is reported
//! as [`ReadOutcome::eof`], never as an error, and a successful read of
//! zero bytes does not by itself mean the stream is finished.

use std::io;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use uplink_sys::{Boundary, DownloadHandle, DownloadResult, RawDownloadOptions, Release};

use crate::error::{Error, Result};
use crate::guard::{self, Scoped};
use crate::marshal::cstring;
use crate::object::Object;
use crate::project::Project;

/// Largest scratch space one [`Download::read`] reserves.
const READ_CHUNK: usize = 256 * 1024;

/// Byte range of a download. The default is the whole object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOptions {
    /// First byte to read.
    pub offset: u64,
    /// Bytes to read from `offset`; `None` reads to the end.
    pub length: Option<u64>,
}

impl DownloadOptions {
    /// `length` bytes starting at `offset`.
    #[must_use]
    pub fn range(offset: u64, length: u64) -> Self {
        Self {
            offset,
            length: Some(length),
        }
    }

    fn to_raw(self) -> Result<RawDownloadOptions> {
        let offset = i64::try_from(self.offset)
            .map_err(|_| Error::invalid_argument("offset", "does not fit in i64"))?;
        let length = match self.length {
            Some(length) => i64::try_from(length)
                .map_err(|_| Error::invalid_argument("length", "does not fit in i64"))?,
            None => -1,
        };
        Ok(RawDownloadOptions { offset, length })
    }
}

/// What one [`Download::read`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes appended by this call.
    pub bytes_read: usize,
    /// Whether the stream is finished.
    pub eof: bool,
}

/// An open object download.
///
/// Closed on drop if [`Download::close`] was not called.
#[derive(Debug)]
pub struct Download<'p> {
    handle: DownloadHandle,
    raw: Scoped<DownloadResult>,
    eof: bool,
    closed: bool,
    _project: PhantomData<&'p Project>,
}

impl Download<'_> {
    fn boundary(&self) -> &dyn Boundary {
        self.raw.boundary()
    }

    fn read_into(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome> {
        let result = self.boundary().download_read(self.handle, buffer);
        let bytes_read = result.bytes_read.min(buffer.len());
        let outcome = match &result.error {
            None => Ok(ReadOutcome {
                bytes_read,
                eof: false,
            }),
            Some(error) if guard::is_eof(error) => Ok(ReadOutcome {
                bytes_read,
                eof: true,
            }),
            Some(error) => Err(Error::from_raw(error)),
        };
        result.release(self.boundary());
        if let Ok(read) = &outcome {
            self.eof |= read.eof;
            trace!(
                download = %self.handle,
                bytes_read = read.bytes_read,
                eof = read.eof,
                "download read"
            );
        }
        outcome
    }

    /// Read up to `max_len` bytes, appending them to `buffer`.
    ///
    /// One call moves at most 256 KiB, whatever `max_len` asks for.
    pub fn read(&mut self, buffer: &mut Vec<u8>, max_len: usize) -> Result<ReadOutcome> {
        let start = buffer.len();
        buffer.resize(start + max_len.min(READ_CHUNK), 0);
        let outcome = self.read_into(&mut buffer[start..]);
        let kept = outcome.as_ref().map_or(0, |read| read.bytes_read);
        buffer.truncate(start + kept);
        outcome
    }

    /// Read until end of stream in steps of `chunk` bytes. Returns the
    /// number of bytes appended.
    pub fn read_to_end(&mut self, buffer: &mut Vec<u8>, chunk: usize) -> Result<usize> {
        if chunk == 0 {
            return Err(Error::invalid_argument("chunk", "must be greater than zero"));
        }
        let mut total = 0;
        loop {
            let read = self.read(buffer, chunk)?;
            total += read.bytes_read;
            if read.eof {
                return Ok(total);
            }
        }
    }

    /// The object being downloaded.
    pub fn info(&self) -> Result<Object> {
        let result = self.boundary().download_info(self.handle);
        guard::value(self.boundary(), result, "download_info", Object::from_raw)
    }

    /// Close the stream, whether or not it was read to the end.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        let error = self.boundary().close_download(self.handle);
        guard::status(self.boundary(), error)?;
        debug!(download = %self.handle, eof = self.eof, "download closed");
        Ok(())
    }
}

impl Drop for Download<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let error = self.boundary().close_download(self.handle);
        if let Err(e) = guard::status(self.boundary(), error) {
            warn!(download = %self.handle, error = %e, "closing download on drop failed");
        }
    }
}

/// Each call makes at most one boundary read. An empty read that is not
/// end of stream surfaces as [`io::ErrorKind::WouldBlock`], so `Ok(0)`
/// always means the stream is finished.
impl io::Read for Download<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.eof {
            return Ok(0);
        }
        let read = self.read_into(buf)?;
        if read.bytes_read == 0 && !read.eof {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "download returned no data"));
        }
        Ok(read.bytes_read)
    }
}

impl Project {
    /// Open a download of an object, optionally restricted to a range.
    pub fn download_object(
        &self,
        bucket: &str,
        key: &str,
        options: Option<&DownloadOptions>,
    ) -> Result<Download<'_>> {
        let bucket_c = cstring("bucket", bucket)?;
        let key_c = cstring("key", key)?;
        let raw_options = options.map(|o| o.to_raw()).transpose()?;
        let result = self.boundary().download_object(
            self.handle(),
            &bucket_c,
            &key_c,
            raw_options.as_ref(),
        );
        let (handle, raw) = guard::owned(self.shared(), result, "download_object")?;
        debug!(download = %handle, bucket, key, "download opened");
        Ok(Download {
            handle,
            raw,
            eof: false,
            closed: false,
            _project: PhantomData,
        })
    }
}
