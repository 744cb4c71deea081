//! Chunk reconciliation: from an unordered bag of seed matches to a
//! target-ordered plan covering the whole artifact.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

/// Where a chunk's bytes come from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChunkKind {
    /// Bytes already present in the local seed.
    Seed,
    /// Bytes fetched from the published artifact.
    Remote,
}

/// A contiguous byte range of the artifact with a declared source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Chunk {
    /// Which source serves the bytes.
    pub kind: ChunkKind,
    /// Length in bytes; at most one block, except for synthesised remote
    /// chunks which may span several missing blocks.
    pub size: u64,
    /// Offset of the bytes inside their source.
    pub source_offset: u64,
    /// Offset the bytes occupy in the artifact.
    pub target_offset: u64,
}

impl Chunk {
    /// First artifact offset past this chunk.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.target_offset + self.size
    }
}

/// Target-ordered, non-overlapping chunk sequence tiling `[0, file_length)`.
#[derive(Clone, Debug)]
pub struct TransferPlan {
    chunks: Vec<Chunk>,
    seed_bytes: u64,
    remote_bytes: u64,
}

impl TransferPlan {
    /// Chunks in ascending target order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Total bytes served from the seed.
    #[must_use]
    pub const fn seed_bytes(&self) -> u64 {
        self.seed_bytes
    }

    /// Total bytes that must be downloaded.
    #[must_use]
    pub const fn remote_bytes(&self) -> u64 {
        self.remote_bytes
    }
}

/// Default minimum size for a reusable seed chunk.
///
/// Reusing a tiny range saves less than the ranged request it displaces
/// costs, so matches at or below this size are re-downloaded as part of the
/// surrounding gap instead. The tail chunk is exempt: dropping it could
/// leave the artifact end unreachable from the seed.
pub const MIN_SEED_CHUNK: u64 = 1024;

/// Builds a [`TransferPlan`] from scanner matches.
#[derive(Clone, Copy, Debug)]
pub struct Planner {
    file_length: u64,
    min_chunk_size: u64,
}

impl Planner {
    /// Creates a planner for an artifact of `file_length` bytes with the
    /// default tiny-match threshold.
    #[must_use]
    pub const fn new(file_length: u64) -> Self {
        Self {
            file_length,
            min_chunk_size: MIN_SEED_CHUNK,
        }
    }

    /// Overrides the tiny-match threshold; matches of `min` bytes or fewer
    /// are dropped (tail excepted).
    #[must_use]
    pub const fn with_min_chunk_size(mut self, min: u64) -> Self {
        self.min_chunk_size = min;
        self
    }

    /// Reconciles `matches` into a covering plan.
    ///
    /// Matches are deduplicated per target block (preferring one whose seed
    /// offset equals its target offset, so unchanged regions stay
    /// identity-mapped), filtered for size, sorted, and the remaining holes
    /// become remote chunks reading the same offsets from the published
    /// artifact.
    #[must_use]
    pub fn plan(&self, matches: Vec<Chunk>) -> TransferPlan {
        let mut by_target: BTreeMap<u64, Chunk> = BTreeMap::new();
        for chunk in matches {
            debug_assert_eq!(chunk.kind, ChunkKind::Seed);
            match by_target.entry(chunk.target_offset) {
                Entry::Vacant(entry) => {
                    entry.insert(chunk);
                }
                Entry::Occupied(mut entry) => {
                    let identity = chunk.source_offset == chunk.target_offset;
                    let kept_identity = entry.get().source_offset == entry.get().target_offset;
                    if identity && !kept_identity {
                        entry.insert(chunk);
                    }
                }
            }
        }

        let mut chunks = Vec::new();
        let mut cursor = 0u64;
        let mut seed_bytes = 0u64;

        for chunk in by_target.into_values() {
            let is_tail = chunk.end() == self.file_length;
            if chunk.size <= self.min_chunk_size && !is_tail {
                continue;
            }
            // Overlapping leftovers lose to the chunk already planned.
            if chunk.target_offset < cursor {
                continue;
            }
            if chunk.target_offset > cursor {
                chunks.push(remote_gap(cursor, chunk.target_offset - cursor));
            }
            cursor = chunk.end();
            seed_bytes += chunk.size;
            chunks.push(chunk);
        }

        if cursor < self.file_length {
            chunks.push(remote_gap(cursor, self.file_length - cursor));
        }

        let remote_bytes = self.file_length - seed_bytes;
        debug!(
            chunks = chunks.len(),
            seed_bytes, remote_bytes, "planned transfer"
        );

        TransferPlan {
            chunks,
            seed_bytes,
            remote_bytes,
        }
    }
}

/// Remote chunks read the artifact at the very offsets they fill.
const fn remote_gap(offset: u64, size: u64) -> Chunk {
    Chunk {
        kind: ChunkKind::Remote,
        size,
        source_offset: offset,
        target_offset: offset,
    }
}
