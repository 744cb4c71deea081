//! Seekable byte sources feeding the scanner and the merge driver.
//!
//! Both ends of a delta update go through the same seam: the seed is a
//! [`FileSource`] (or a [`MemorySource`] in tests), the remote side is an
//! HTTP-backed implementation living in the transport crate. Keeping the
//! trait here lets the matcher and merger stay ignorant of where bytes come
//! from.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::SourceError;

/// A source of artifact or seed bytes addressable by absolute offset.
pub trait ChunkSource {
    /// Positions the source at `offset` bytes from the start.
    fn seek_to(&mut self, offset: u64) -> Result<(), SourceError>;

    /// Fills `buf` completely from the current position, advancing it.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<(), SourceError>;

    /// Hints that the next reads will consume `len` bytes from the current
    /// position. Network-backed sources use this to cover a whole chunk
    /// with a single ranged request; local sources ignore it.
    fn prefetch(&mut self, len: u64) -> Result<(), SourceError> {
        let _ = len;
        Ok(())
    }
}

/// Read-only file-backed source for the seed.
#[derive(Debug)]
pub struct FileSource {
    file: File,
}

impl FileSource {
    /// Opens `path` read-only.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Ok(Self {
            file: File::open(path)?,
        })
    }

    /// Size of the underlying file in bytes.
    pub fn len(&self) -> Result<u64, SourceError> {
        Ok(self.file.metadata()?.len())
    }
}

impl ChunkSource for FileSource {
    fn seek_to(&mut self, offset: u64) -> Result<(), SourceError> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read_full(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        self.file.read_exact(buf)?;
        Ok(())
    }
}

/// In-memory source, used by tests and small fixtures.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
}

impl MemorySource {
    /// Wraps `data` as a source positioned at offset zero.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes the source holds.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the source holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ChunkSource for MemorySource {
    fn seek_to(&mut self, offset: u64) -> Result<(), SourceError> {
        if offset > self.data.len() as u64 {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "seek past end of in-memory source",
            )));
        }
        self.pos = offset as usize;
        Ok(())
    }

    fn read_full(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        let available = self.data.len() - self.pos;
        if buf.len() > available {
            return Err(SourceError::ShortRead {
                got: available as u64,
                want: buf.len() as u64,
            });
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_reads_at_offset() {
        let mut source = MemorySource::new((0u8..32).collect());
        source.seek_to(10).unwrap();
        let mut buf = [0u8; 4];
        source.read_full(&mut buf).unwrap();
        assert_eq!(buf, [10, 11, 12, 13]);
    }

    #[test]
    fn memory_source_rejects_reads_past_end() {
        let mut source = MemorySource::new(vec![1, 2, 3]);
        source.seek_to(2).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(
            source.read_full(&mut buf),
            Err(SourceError::ShortRead { got: 1, want: 4 })
        ));
    }

    #[test]
    fn file_source_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let mut source = FileSource::open(&path).unwrap();
        assert_eq!(source.len().unwrap(), 10);

        source.seek_to(4).unwrap();
        let mut buf = [0u8; 3];
        source.read_full(&mut buf).unwrap();
        assert_eq!(&buf, b"456");
    }
}
