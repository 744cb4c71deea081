#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the checksum primitives used by the zsync delta
//! engine:
//!
//! - [`RollingChecksum`] implements the Adler-32–style weak checksum
//!   (`rsum`) that a zsync client slides over the seed file one byte at a
//!   time.
//! - [`strong`] exposes the MD4 block digest that confirms weak-sum
//!   candidates and the SHA-1 digest that authenticates the reconstructed
//!   artifact.
//!
//! The modules are intentionally small; everything that interprets checksums
//! (index lookup, matching, verification) lives in higher layers.
//!
//! # Invariants
//!
//! - [`RollingChecksum`] truncates both state components to 16 bits after
//!   every update, so the packed value is stable across platforms.
//! - Rolling the window by one byte is O(1) and equals a fresh computation
//!   over the shifted window.
//! - Digests stream data incrementally and never panic; the only fallible
//!   operation is re-seeding the rolling window with a slice of the wrong
//!   length, reported through [`RollingError`].
//!
//! # Examples
//!
//! Compute the weak checksum of a window and slide it by one byte.
//!
//! ```
//! use checksums::RollingChecksum;
//!
//! let mut rolling = RollingChecksum::new(4);
//! rolling.reset_with(b"abcd").unwrap();
//!
//! // Replace the oldest byte `a` with a new byte `e`.
//! rolling.roll(b'a', b'e');
//!
//! let mut fresh = RollingChecksum::new(4);
//! fresh.reset_with(b"bcde").unwrap();
//! assert_eq!(rolling.value(), fresh.value());
//! ```

mod rolling;
pub mod strong;

pub use rolling::{RollingChecksum, RollingError};
pub use strong::{Sha1Sum, StrongSum};
