//! Strong digests: MD4 for block confirmation, SHA-1 for whole-artifact
//! verification.
//!
//! Both types are thin streaming wrappers over the RustCrypto implementations
//! with explicit `new`/`update`/`finalize` state, so callers can feed blocks
//! or whole files incrementally without hidden globals.

use std::io::{self, Read};

use digest::Digest;

/// Streaming MD4 hasher for zsync block checksums.
///
/// The control file advertises a `strong_bytes` length in `[3, 16]`; callers
/// truncate the 128-bit output to that prefix when comparing against the
/// published checksum table.
#[derive(Clone, Debug, Default)]
pub struct StrongSum {
    inner: md4::Md4,
}

impl StrongSum {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: md4::Md4::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest and returns the 128-bit MD4 output.
    #[must_use]
    pub fn finalize(self) -> [u8; 16] {
        self.inner.finalize().into()
    }

    /// Convenience helper that computes the MD4 digest for `data` in one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; 16] {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Streaming SHA-1 hasher for the reconstructed artifact.
///
/// zsync control files carry the artifact digest as lowercase hex, so the
/// finaliser returns hex directly.
#[derive(Clone, Debug, Default)]
pub struct Sha1Sum {
    inner: sha1::Sha1,
}

impl Sha1Sum {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: sha1::Sha1::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest and returns it as lowercase hex.
    #[must_use]
    pub fn finalize_hex(self) -> String {
        to_hex(&self.inner.finalize())
    }

    /// Streams the full contents of `reader` into the digest state.
    pub fn update_reader<R: Read>(&mut self, reader: &mut R) -> io::Result<u64> {
        let mut buffer = vec![0u8; 32 * 1024];
        let mut total = 0u64;
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    self.update(&buffer[..n]);
                    total += n as u64;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(total)
    }

    /// Computes the hex digest of everything `reader` yields.
    pub fn digest_reader<R: Read>(reader: &mut R) -> io::Result<String> {
        let mut hasher = Self::new();
        hasher.update_reader(reader)?;
        Ok(hasher.finalize_hex())
    }
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}
