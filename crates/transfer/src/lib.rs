#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `transfer` is the HTTP side of a zsync update: fetching the control file
//! and serving the artifact's missing byte ranges to the engine.
//!
//! [`RangeSource`] implements [`engine::ChunkSource`] over ranged GET
//! requests. The merge driver announces each remote chunk through
//! `prefetch`, so one chunk costs one request regardless of how many reads
//! drain it afterwards. Servers must honour ranges literally: anything but
//! `206 Partial Content` with an identity-encoded body of the exact length
//! aborts the update rather than risking a corrupt artifact.
//!
//! All requests are synchronous and sequential on the calling thread, with
//! bounded connect and read timeouts.

mod error;
mod fetch;
mod range;

pub use error::FetchError;
pub use fetch::{fetch_control, http_client, resolve_url};
pub use range::RangeSource;
