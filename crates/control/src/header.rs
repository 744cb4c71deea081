/// Hash-length tuple advertised by the `Hash-Lengths` header field.
///
/// The publisher shrinks the per-block records to the smallest sizes that
/// keep the collision probability acceptable for the artifact, so the table
/// stores only `weak_bytes` of the rolling sum and `strong_bytes` of the MD4
/// digest per block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HashLengths {
    /// Number of consecutive block matches the publisher sized the table
    /// for. Always in `[1, 2]`; parsed and validated but not enforced by the
    /// matcher.
    pub seq_matches: u8,
    /// Bytes of the weak rolling sum stored per block, in `[1, 4]`.
    pub weak_bytes: u8,
    /// Bytes of the MD4 digest stored per block, in `[3, 16]`.
    pub strong_bytes: u8,
}

impl HashLengths {
    /// Size in bytes of one checksum-table record.
    #[inline]
    #[must_use]
    pub const fn record_len(self) -> usize {
        self.weak_bytes as usize + self.strong_bytes as usize
    }
}

/// Decoded header of a zsync control file.
///
/// String fields are kept verbatim (trimmed); `mtime` in particular is an
/// RFC 1123 date the engine treats as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlHeader {
    /// Producer version from the `zsync` line, when present.
    pub version: Option<String>,
    /// Modification time of the artifact, opaque to the engine.
    pub mtime: Option<String>,
    /// Basename the reconstructed artifact should be written as.
    pub filename: String,
    /// Size of one artifact block; non-zero.
    pub block_size: u32,
    /// Total size of the new artifact in bytes.
    pub file_length: u64,
    /// Per-record checksum sizing.
    pub hash_lengths: HashLengths,
    /// Where the artifact bytes live: absolute `http(s)`/`ftp`, or relative
    /// to the control file's own URL.
    pub url: String,
    /// Lowercase hex SHA-1 of the whole artifact.
    pub sha1: String,
    /// Header lines with unrecognised keys, preserved in file order.
    pub unknown: Vec<(String, String)>,
}

impl ControlHeader {
    /// Number of blocks the artifact divides into, counting the final
    /// partial block.
    #[inline]
    #[must_use]
    pub const fn block_count(&self) -> u64 {
        self.file_length.div_ceil(self.block_size as u64)
    }

    /// Exact byte length the checksum table must have.
    #[inline]
    #[must_use]
    pub const fn table_len(&self) -> usize {
        self.block_count() as usize * self.hash_lengths.record_len()
    }
}
