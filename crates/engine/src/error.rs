use std::io;

use thiserror::Error;

/// Errors raised by a [`crate::ChunkSource`] while seeking or reading.
///
/// Local sources only ever produce [`SourceError::Io`]; the transport-shaped
/// variants exist so HTTP-backed sources can report range and encoding
/// violations without this crate depending on any HTTP client.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying I/O failure (file read/seek, socket read).
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Connection-level transport failure (timeout, refused, DNS).
    #[error("transport error for {url}: {message}")]
    Transport {
        /// URL the request targeted.
        url: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The server answered a ranged request with something other than
    /// `206 Partial Content`.
    #[error("{url} does not support ranged requests (status {status})")]
    RangeUnsupported {
        /// URL the request targeted.
        url: String,
        /// Status the server actually returned.
        status: u16,
    },

    /// The server reported the artifact missing.
    #[error("{url} not found")]
    NotFound {
        /// URL the request targeted.
        url: String,
    },

    /// The server compressed the body of a ranged response, so byte offsets
    /// no longer line up with the artifact.
    #[error("{url} served a compressed body for a ranged request")]
    Compressed {
        /// URL the request targeted.
        url: String,
    },

    /// The body ended before the requested range was fully delivered.
    #[error("short read: got {got} bytes, wanted {want}")]
    ShortRead {
        /// Bytes actually delivered.
        got: u64,
        /// Bytes the range requested.
        want: u64,
    },
}

/// Errors surfaced by an update attempt.
///
/// The variants distinguish which side of the transfer failed because the
/// caller's obligations differ: seed failures happen before any output
/// exists, transport failures require removing the partial output, and a
/// checksum mismatch after a complete merge is fatal rather than transient.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Reading or seeking the seed failed.
    #[error("seed read failed: {0}")]
    Seed(SourceError),

    /// Fetching artifact bytes from the remote source failed.
    #[error("remote read failed: {0}")]
    Remote(SourceError),

    /// Creating or writing the output failed.
    #[error("output write failed: {0}")]
    Output(#[from] io::Error),

    /// The reconstructed artifact does not hash to the digest the control
    /// file advertised.
    #[error("output checksum mismatch: expected sha1 {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Digest from the control header, lowercase hex.
        expected: String,
        /// Digest of the bytes actually written, lowercase hex.
        actual: String,
    },

    /// The caller cancelled the attempt.
    #[error("update cancelled")]
    Cancelled,
}
