//! Sequencing of one update attempt: scan, plan, merge, verify.

use control::{ChecksumIndex, ControlHeader};
use tracing::debug;

use crate::error::EngineError;
use crate::merge::merge_plan;
use crate::plan::Planner;
use crate::progress::{CancellationFlag, ProgressEvent};
use crate::scanner::SeedScanner;
use crate::source::ChunkSource;

/// Byte accounting for a finished attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpdateSummary {
    /// Bytes served from the local seed.
    pub bytes_from_seed: u64,
    /// Bytes downloaded from the remote source.
    pub bytes_from_remote: u64,
}

/// One-shot delta reconstruction of the artifact described by a parsed
/// control file.
///
/// The driver owns the sequencing only; the seed and remote sources, the
/// output writer, and the surrounding filesystem transaction belong to the
/// caller. Phases run strictly in order on the calling thread:
/// scan → plan → merge → verify.
#[derive(Clone, Copy, Debug)]
pub struct DeltaUpdate<'a> {
    header: &'a ControlHeader,
    index: &'a ChecksumIndex,
    planner: Planner,
}

impl<'a> DeltaUpdate<'a> {
    /// Creates a driver for `header` with its checksum `index`.
    #[must_use]
    pub fn new(header: &'a ControlHeader, index: &'a ChecksumIndex) -> Self {
        Self {
            header,
            index,
            planner: Planner::new(header.file_length),
        }
    }

    /// Overrides the planner's tiny-match threshold.
    #[must_use]
    pub const fn with_min_chunk_size(mut self, min: u64) -> Self {
        self.planner = self.planner.with_min_chunk_size(min);
        self
    }

    /// Reconstructs the artifact into `output`.
    ///
    /// `seed_len` is the seed's total size; the remote source must serve the
    /// published artifact's bytes. On success the output writer holds
    /// exactly `file_length` verified bytes.
    pub fn run<S, R, W>(
        &self,
        seed: &mut S,
        seed_len: u64,
        remote: &mut R,
        output: &mut W,
        cancel: &CancellationFlag,
        mut progress: impl FnMut(ProgressEvent),
    ) -> Result<UpdateSummary, EngineError>
    where
        S: ChunkSource,
        R: ChunkSource,
        W: std::io::Write,
    {
        debug!(seed_len, file_length = self.header.file_length, "scanning seed");
        let scanner = SeedScanner::new(self.header, self.index);
        let matches = scanner.scan(seed, seed_len, cancel, &mut progress)?;

        let plan = self.planner.plan(matches);
        debug!(
            reusable = plan.seed_bytes(),
            missing = plan.remote_bytes(),
            "transfer planned"
        );

        merge_plan(
            &plan,
            seed,
            remote,
            output,
            &self.header.sha1,
            cancel,
            &mut progress,
        )?;

        Ok(UpdateSummary {
            bytes_from_seed: plan.seed_bytes(),
            bytes_from_remote: plan.remote_bytes(),
        })
    }
}
