#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` reconstructs a new artifact from two byte sources: ranges of a
//! locally held older copy (the *seed*) that the control file proves are
//! still valid, and ranges of the published copy fetched by a remote source.
//!
//! One update attempt flows through four stages, driven by [`DeltaUpdate`]:
//!
//! 1. [`SeedScanner`] slides a `block_size` window over the seed, querying
//!    the checksum index at every byte, and collects reusable chunks.
//! 2. [`Planner`] reconciles the matches into a target-ordered
//!    [`TransferPlan`] that tiles the whole artifact, filling holes with
//!    remote chunks.
//! 3. [`merge_plan`] streams the plan into the output writer while feeding
//!    a running SHA-1, then compares against the digest the publisher
//!    advertised.
//! 4. [`OutputTransaction`] wraps the filesystem bookkeeping so a failed
//!    attempt leaves the seed exactly where it started and no partial
//!    output behind.
//!
//! Everything is synchronous and single-threaded; cancellation is
//! cooperative through a [`CancellationFlag`] checked between chunks, and
//! progress surfaces through a synchronous [`ProgressEvent`] callback.

mod driver;
mod error;
mod merge;
mod output;
mod plan;
mod progress;
mod scanner;
mod source;

pub use driver::{DeltaUpdate, UpdateSummary};
pub use error::{EngineError, SourceError};
pub use merge::merge_plan;
pub use output::OutputTransaction;
pub use plan::{Chunk, ChunkKind, Planner, TransferPlan};
pub use progress::{CancellationFlag, ProgressEvent};
pub use scanner::SeedScanner;
pub use source::{ChunkSource, FileSource, MemorySource};
