//! Shared fixtures for zsync update tests.
//!
//! The centrepiece is [`control_file`], which assembles a complete control
//! file (header plus block checksum table) for an in-memory artifact. Tests
//! use it to stay hermetic: fixtures are derived from the same checksum
//! primitives the engine matches against, so a change in either side shows
//! up as a test failure instead of a silently stale fixture.

use checksums::{RollingChecksum, Sha1Sum, StrongSum};

/// Knobs for [`control_file`]; the defaults mirror what `zsyncmake` emits
/// for a small artifact.
#[derive(Clone, Debug)]
pub struct ControlOptions {
    /// Value of the `Filename` header field.
    pub filename: String,
    /// Value of the `URL` header field.
    pub url: String,
    /// Stored bytes of the weak sum per block, `[1, 4]`.
    pub weak_bytes: u8,
    /// Stored bytes of the MD4 digest per block, `[3, 16]`.
    pub strong_bytes: u8,
    /// First component of `Hash-Lengths`.
    pub seq_matches: u8,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            filename: "app.AppImage".to_owned(),
            url: "app.AppImage".to_owned(),
            weak_bytes: 4,
            strong_bytes: 16,
            seq_matches: 1,
        }
    }
}

/// Builds the bytes of a control file describing `artifact`.
#[must_use]
pub fn control_file(artifact: &[u8], block_size: u32, options: ControlOptions) -> Vec<u8> {
    let mut data = format!(
        "zsync: 0.6.2\n\
         Filename: {}\n\
         MTime: Sat, 01 Jan 2022 10:00:00 +0000\n\
         Blocksize: {}\n\
         Length: {}\n\
         Hash-Lengths: {},{},{}\n\
         URL: {}\n\
         SHA-1: {}\n\
         \n",
        options.filename,
        block_size,
        artifact.len(),
        options.seq_matches,
        options.weak_bytes,
        options.strong_bytes,
        options.url,
        sha1_hex(artifact),
    )
    .into_bytes();

    data.extend_from_slice(&checksum_table(
        artifact,
        block_size,
        options.weak_bytes,
        options.strong_bytes,
    ));
    data
}

/// Builds only the binary checksum table for `artifact`.
#[must_use]
pub fn checksum_table(
    artifact: &[u8],
    block_size: u32,
    weak_bytes: u8,
    strong_bytes: u8,
) -> Vec<u8> {
    let block = block_size as usize;
    let mut table = Vec::new();

    for chunk in artifact.chunks(block) {
        let mut padded = chunk.to_vec();
        padded.resize(block, 0);

        let mut rolling = RollingChecksum::new(block_size);
        rolling
            .reset_with(&padded)
            .expect("padded block has exactly block_size bytes");
        // Zero-padded on the most-significant side: keep the low-order bytes.
        let weak = rolling.value().to_be_bytes();
        table.extend_from_slice(&weak[4 - weak_bytes as usize..]);

        let strong = StrongSum::digest(&padded);
        table.extend_from_slice(&strong[..strong_bytes as usize]);
    }

    // Zero-length artifacts have no blocks and an empty table.
    table
}

/// Lowercase hex SHA-1 of `data`.
#[must_use]
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1Sum::new();
    hasher.update(data);
    hasher.finalize_hex()
}
