//! Byte-by-byte seed scanning against the checksum index.
//!
//! The scanner slides a `block_size` window across the seed. Each position
//! costs one O(1) rolling-checksum update; only positions whose weak sum hits
//! the index pay for an MD4 digest. A confirmed match advances the window a
//! whole block, so an unchanged seed is scanned in `seed_len / block_size`
//! steps while arbitrary insertions are still found at any byte offset.

use std::collections::VecDeque;

use checksums::{RollingChecksum, StrongSum};
use control::{ChecksumIndex, ControlHeader};
use tracing::debug;

use crate::error::{EngineError, SourceError};
use crate::plan::{Chunk, ChunkKind};
use crate::progress::{CancellationFlag, ProgressEvent};
use crate::source::ChunkSource;

const FEED_BUFFER: usize = 64 * 1024;
const PROGRESS_STRIDE: u64 = 256 * 1024;

/// Finds seed ranges that can be reused in the new artifact.
#[derive(Clone, Copy, Debug)]
pub struct SeedScanner<'a> {
    index: &'a ChecksumIndex,
    block_size: u64,
    file_length: u64,
}

impl<'a> SeedScanner<'a> {
    /// Creates a scanner for the artifact described by `header` and its
    /// checksum `index`.
    #[must_use]
    pub fn new(header: &ControlHeader, index: &'a ChecksumIndex) -> Self {
        Self {
            index,
            block_size: u64::from(header.block_size),
            file_length: header.file_length,
        }
    }

    /// Scans `seed` (of `seed_len` bytes) and returns every block match as a
    /// seed chunk, unordered and possibly overlapping in target space.
    ///
    /// The window past end of seed is zero-padded, which permits a tail
    /// match against the artifact's zero-padded final block; such a match is
    /// clipped so it never extends past `file_length`.
    pub fn scan<S: ChunkSource>(
        &self,
        seed: &mut S,
        seed_len: u64,
        cancel: &CancellationFlag,
        mut progress: impl FnMut(ProgressEvent),
    ) -> Result<Vec<Chunk>, EngineError> {
        let mut matches = Vec::new();
        if seed_len == 0 || self.index.block_count() == 0 {
            return Ok(matches);
        }

        seed.seek_to(0).map_err(EngineError::Seed)?;
        let mut feed = Feed::new(seed, seed_len);

        let block = self.block_size as usize;
        let mut window: VecDeque<u8> = VecDeque::with_capacity(block);
        feed.fill_window(&mut window, block).map_err(EngineError::Seed)?;

        let mut rolling = RollingChecksum::new(self.block_size as u32);
        reseed(&mut rolling, &window);

        let mut pos = 0u64;
        let mut last_report = 0u64;

        while pos < seed_len {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            let emitted = self.match_window(&window, &rolling, pos, seed_len, &mut matches);

            if emitted {
                // Skip a whole block and refill the window behind it.
                pos += self.block_size;
                if pos >= seed_len {
                    break;
                }
                window.clear();
                feed.fill_window(&mut window, block).map_err(EngineError::Seed)?;
                reseed(&mut rolling, &window);
            } else {
                let outgoing = window.pop_front().unwrap_or_default();
                let incoming = if pos + self.block_size < seed_len {
                    feed.next_byte().map_err(EngineError::Seed)?
                } else {
                    0
                };
                window.push_back(incoming);
                rolling.roll(outgoing, incoming);
                pos += 1;
            }

            if pos - last_report >= PROGRESS_STRIDE {
                last_report = pos;
                progress(ProgressEvent::SeedScanned {
                    scanned: pos.min(seed_len),
                    total: seed_len,
                });
            }
        }

        progress(ProgressEvent::SeedScanned {
            scanned: seed_len,
            total: seed_len,
        });
        debug!(matches = matches.len(), seed_len, "seed scan finished");
        Ok(matches)
    }

    /// Queries the index for the current window; returns whether any chunk
    /// was emitted.
    fn match_window(
        &self,
        window: &VecDeque<u8>,
        rolling: &RollingChecksum,
        pos: u64,
        seed_len: u64,
        matches: &mut Vec<Chunk>,
    ) -> bool {
        let candidates = self.index.find_weak(rolling.value());
        if candidates.is_empty() {
            return false;
        }

        let mut hasher = StrongSum::new();
        let (front, back) = window.as_slices();
        hasher.update(front);
        hasher.update(back);
        let digest = hasher.finalize();

        let real = self.block_size.min(seed_len - pos);
        let mut emitted = false;
        for block in self.index.verify_strong(candidates, &digest) {
            let target_offset = block * self.block_size;
            // Clip both the zero-padded seed tail and the artifact tail.
            let size = real.min(self.file_length - target_offset);
            if size == 0 {
                continue;
            }
            matches.push(Chunk {
                kind: ChunkKind::Seed,
                size,
                source_offset: pos,
                target_offset,
            });
            emitted = true;
        }
        emitted
    }
}

fn reseed(rolling: &mut RollingChecksum, window: &VecDeque<u8>) {
    rolling.reset();
    let (front, back) = window.as_slices();
    rolling.update(front);
    rolling.update(back);
}

/// Sequential buffered reader over a [`ChunkSource`], zero-padding past the
/// end of the seed.
struct Feed<'a, S: ChunkSource> {
    source: &'a mut S,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    remaining: u64,
}

impl<'a, S: ChunkSource> Feed<'a, S> {
    fn new(source: &'a mut S, total: u64) -> Self {
        Self {
            source,
            buf: vec![0u8; FEED_BUFFER],
            pos: 0,
            filled: 0,
            remaining: total,
        }
    }

    fn next_byte(&mut self) -> Result<u8, SourceError> {
        if self.pos == self.filled {
            if self.remaining == 0 {
                return Ok(0);
            }
            let take = self.buf.len().min(self.remaining as usize);
            self.source.read_full(&mut self.buf[..take])?;
            self.pos = 0;
            self.filled = take;
            self.remaining -= take as u64;
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Appends `len` bytes to `window`, zero-padding once the seed runs dry.
    fn fill_window(&mut self, window: &mut VecDeque<u8>, len: usize) -> Result<(), SourceError> {
        for _ in 0..len {
            if self.buffered() == 0 && self.remaining == 0 {
                window.push_back(0);
            } else {
                let byte = self.next_byte()?;
                window.push_back(byte);
            }
        }
        Ok(())
    }

    fn buffered(&self) -> usize {
        self.filled - self.pos
    }
}
