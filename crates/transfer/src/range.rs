use engine::{ChunkSource, SourceError};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, RANGE};
use reqwest::StatusCode;
use tracing::trace;

/// HTTP-backed [`ChunkSource`] serving artifact bytes with ranged GETs.
///
/// Every network round trip fetches one contiguous range. The merge driver
/// announces each remote chunk with [`ChunkSource::prefetch`], which issues
/// a single request covering the chunk and buffers the body; the driver's
/// subsequent reads drain the buffer without touching the network. A read
/// that outruns the buffer issues its own exact-size request.
#[derive(Debug)]
pub struct RangeSource {
    client: Client,
    url: String,
    /// Artifact offset of the next byte handed to the reader.
    offset: u64,
    buffer: Vec<u8>,
    buffered_at: usize,
}

impl RangeSource {
    /// Creates a source reading `url` with the given client.
    #[must_use]
    pub fn new(client: Client, url: String) -> Self {
        Self {
            client,
            url,
            offset: 0,
            buffer: Vec::new(),
            buffered_at: 0,
        }
    }

    /// URL the source reads from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn buffered(&self) -> usize {
        self.buffer.len() - self.buffered_at
    }

    /// Issues one ranged GET for `[start, start + len)` and returns exactly
    /// `len` bytes.
    fn request_range(&self, start: u64, len: u64) -> Result<Vec<u8>, SourceError> {
        let end = start + len - 1;
        trace!(url = %self.url, start, end, "ranged request");

        let response = self
            .client
            .get(&self.url)
            .header(RANGE, format!("bytes={start}-{end}"))
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .map_err(|err| SourceError::Transport {
                url: self.url.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound {
                url: self.url.clone(),
            });
        }
        if status != StatusCode::PARTIAL_CONTENT {
            return Err(SourceError::RangeUnsupported {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let compressed = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("gzip"));
        if compressed {
            return Err(SourceError::Compressed {
                url: self.url.clone(),
            });
        }

        let body = response.bytes().map_err(|err| SourceError::Transport {
            url: self.url.clone(),
            message: err.to_string(),
        })?;
        if (body.len() as u64) < len {
            return Err(SourceError::ShortRead {
                got: body.len() as u64,
                want: len,
            });
        }

        // Servers occasionally pad past the requested range; everything
        // beyond it is discarded.
        let mut body = body.to_vec();
        body.truncate(len as usize);
        Ok(body)
    }
}

impl ChunkSource for RangeSource {
    fn seek_to(&mut self, offset: u64) -> Result<(), SourceError> {
        if offset != self.offset {
            self.offset = offset;
            self.buffer.clear();
            self.buffered_at = 0;
        }
        Ok(())
    }

    fn read_full(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        if buf.is_empty() {
            return Ok(());
        }
        let mut filled = 0;

        let available = self.buffered().min(buf.len());
        if available > 0 {
            buf[..available]
                .copy_from_slice(&self.buffer[self.buffered_at..self.buffered_at + available]);
            self.buffered_at += available;
            self.offset += available as u64;
            filled = available;
        }

        if filled < buf.len() {
            let rest = (buf.len() - filled) as u64;
            let body = self.request_range(self.offset, rest)?;
            buf[filled..].copy_from_slice(&body);
            self.offset += rest;
        }

        if self.buffered() == 0 {
            self.buffer.clear();
            self.buffered_at = 0;
        }
        Ok(())
    }

    fn prefetch(&mut self, len: u64) -> Result<(), SourceError> {
        let buffered = self.buffered() as u64;
        if buffered >= len {
            return Ok(());
        }
        let body = self.request_range(self.offset + buffered, len - buffered)?;
        self.buffer.extend_from_slice(&body);
        Ok(())
    }
}
