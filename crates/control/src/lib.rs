#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `control` decodes the zsync sidecar file that a publisher ships next to a
//! new artifact. A control file is a text header (`Key: Value` lines ended by
//! a blank line) followed by a binary table of per-block checksums:
//!
//! ```text
//! zsync: 0.6.2
//! Filename: app.AppImage
//! MTime: Sat, 01 Jan 2022 10:00:00 +0000
//! Blocksize: 2048
//! Length: 104857600
//! Hash-Lengths: 2,2,5
//! URL: app.AppImage
//! SHA-1: 3a52ce780950d4d969792a2559cd519d7ee8c727
//!
//! <block_count records of weak_bytes + strong_bytes bytes>
//! ```
//!
//! [`parse`] splits the file into a [`ControlHeader`] and the raw table
//! bytes; [`ChecksumIndex`] turns the table into the weak-sum multimap the
//! seed scanner queries on every window position.

mod error;
mod header;
mod index;
mod parse;

pub use error::ControlError;
pub use header::{ControlHeader, HashLengths};
pub use index::ChecksumIndex;
pub use parse::parse;
