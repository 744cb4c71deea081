use rustc_hash::FxHashMap;
use tracing::debug;

use crate::header::ControlHeader;

/// In-memory index over the control file's block checksum table.
///
/// The index answers the two questions the seed scanner asks at every window
/// position: which blocks share the window's (truncated) weak sum, and which
/// of those also carry the window's truncated MD4 digest. Weak lookups hit a
/// multimap keyed by the truncated sum; strong sums stay in one flat buffer
/// indexed by block number.
#[derive(Clone, Debug)]
pub struct ChecksumIndex {
    weak_buckets: FxHashMap<u32, Vec<u64>>,
    strong_sums: Vec<u8>,
    strong_bytes: usize,
    weak_mask: u32,
    block_count: u64,
}

impl ChecksumIndex {
    /// Builds the index from a parsed header and its checksum table.
    ///
    /// `table` must be exactly the slice returned by [`crate::parse`]; each
    /// record holds the weak sum zero-padded on the most-significant side
    /// (big-endian) followed by the truncated strong sum.
    #[must_use]
    pub fn build(header: &ControlHeader, table: &[u8]) -> Self {
        let weak_bytes = header.hash_lengths.weak_bytes as usize;
        let strong_bytes = header.hash_lengths.strong_bytes as usize;
        let block_count = header.block_count();

        let mut weak_buckets: FxHashMap<u32, Vec<u64>> = FxHashMap::default();
        let mut strong_sums = Vec::with_capacity(block_count as usize * strong_bytes);

        for (block, record) in table.chunks_exact(weak_bytes + strong_bytes).enumerate() {
            let weak = record[..weak_bytes]
                .iter()
                .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte));
            weak_buckets.entry(weak).or_default().push(block as u64);
            strong_sums.extend_from_slice(&record[weak_bytes..]);
        }

        debug!(
            blocks = block_count,
            buckets = weak_buckets.len(),
            "built checksum index"
        );

        Self {
            weak_buckets,
            strong_sums,
            strong_bytes,
            weak_mask: weak_mask(weak_bytes),
            block_count,
        }
    }

    /// Number of blocks the index covers.
    #[inline]
    #[must_use]
    pub const fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Reduces a full 32-bit rolling sum to the bits stored in the table.
    #[inline]
    #[must_use]
    pub const fn truncate_weak(&self, weak: u32) -> u32 {
        weak & self.weak_mask
    }

    /// Returns the indices of all blocks sharing the truncated weak sum, in
    /// ascending block order. The full 32-bit sum may be passed; truncation
    /// happens here.
    #[must_use]
    pub fn find_weak(&self, weak: u32) -> &[u64] {
        self.weak_buckets
            .get(&self.truncate_weak(weak))
            .map_or(&[], Vec::as_slice)
    }

    /// Filters weak candidates down to those whose stored strong sum matches
    /// the computed digest. `strong` must be at least `strong_bytes` long;
    /// only that prefix is compared.
    pub fn verify_strong<'a>(
        &'a self,
        candidates: &'a [u64],
        strong: &'a [u8],
    ) -> impl Iterator<Item = u64> + 'a {
        let prefix = &strong[..self.strong_bytes];
        candidates
            .iter()
            .copied()
            .filter(move |&block| self.strong_of(block) == prefix)
    }

    /// Stored (truncated) strong sum of one block.
    #[must_use]
    pub fn strong_of(&self, block: u64) -> &[u8] {
        let start = block as usize * self.strong_bytes;
        &self.strong_sums[start..start + self.strong_bytes]
    }
}

const fn weak_mask(weak_bytes: usize) -> u32 {
    if weak_bytes >= 4 {
        u32::MAX
    } else {
        (1u32 << (weak_bytes * 8)) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::header::HashLengths;

    fn header(block_size: u32, file_length: u64, weak_bytes: u8, strong_bytes: u8) -> ControlHeader {
        ControlHeader {
            version: None,
            mtime: None,
            filename: "artifact".to_owned(),
            block_size,
            file_length,
            hash_lengths: HashLengths {
                seq_matches: 1,
                weak_bytes,
                strong_bytes,
            },
            url: "artifact".to_owned(),
            sha1: String::new(),
            unknown: Vec::new(),
        }
    }

    #[test]
    fn indexes_records_by_weak_sum() {
        // Three blocks: weak sums 0x0102, 0x0304, 0x0102 with 3-byte strongs.
        let table = [
            0x01, 0x02, 0xaa, 0xab, 0xac, //
            0x03, 0x04, 0xba, 0xbb, 0xbc, //
            0x01, 0x02, 0xca, 0xcb, 0xcc,
        ];
        let index = ChecksumIndex::build(&header(2048, 3 * 2048, 2, 3), &table);

        assert_eq!(index.block_count(), 3);
        assert_eq!(index.find_weak(0x0102), &[0, 2]);
        assert_eq!(index.find_weak(0x0304), &[1]);
        assert!(index.find_weak(0x0505).is_empty());
    }

    #[test]
    fn lookup_truncates_the_queried_sum() {
        let table = [0x01, 0x02, 0xaa, 0xab, 0xac];
        let index = ChecksumIndex::build(&header(2048, 2048, 2, 3), &table);

        // High half of the rolling sum is not stored and must not affect lookup.
        assert_eq!(index.find_weak(0xdead_0102), &[0]);
    }

    #[test]
    fn verify_strong_filters_candidates() {
        let table = [
            0x01, 0x02, 0xaa, 0xab, 0xac, //
            0x01, 0x02, 0xba, 0xbb, 0xbc,
        ];
        let index = ChecksumIndex::build(&header(2048, 2 * 2048, 2, 3), &table);

        let candidates = index.find_weak(0x0102);
        // Computed digests are full 16-byte MD4 outputs; only the stored
        // prefix participates in the comparison.
        let digest = [
            0xba, 0xbb, 0xbc, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff,
        ];
        let verified: Vec<u64> = index.verify_strong(candidates, &digest).collect();
        assert_eq!(verified, vec![1]);

        let miss = [0u8; 16];
        assert_eq!(index.verify_strong(candidates, &miss).count(), 0);
    }

    #[test]
    fn single_byte_weak_mask() {
        let table = [0x7f, 0xaa, 0xab, 0xac];
        let index = ChecksumIndex::build(&header(2048, 2048, 1, 3), &table);
        assert_eq!(index.truncate_weak(0xffff_ff7f), 0x7f);
        assert_eq!(index.find_weak(0xffff_ff7f), &[0]);
    }
}
