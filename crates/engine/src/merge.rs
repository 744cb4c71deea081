//! Plan execution: stream chunks in target order, verify the result.

use std::io::Write;

use checksums::Sha1Sum;
use tracing::{debug, trace};

use crate::error::EngineError;
use crate::plan::{ChunkKind, TransferPlan};
use crate::progress::{CancellationFlag, ProgressEvent};
use crate::source::ChunkSource;

const COPY_BUFFER: usize = 64 * 1024;

/// Writes `plan` to `output`, pulling each chunk from `seed` or `remote`,
/// and verifies the artifact SHA-1 against `expected_sha1` (hex, any case).
///
/// Output bytes are produced strictly in ascending target order with no
/// seeks, so `output` may be any writer. Remote chunks are announced to the
/// source through [`ChunkSource::prefetch`] first, letting an HTTP source
/// cover the whole chunk with one ranged request.
///
/// # Errors
///
/// Read failures carry their origin ([`EngineError::Seed`] or
/// [`EngineError::Remote`]); a digest that does not match after a complete
/// merge is [`EngineError::ChecksumMismatch`].
pub fn merge_plan<S, R, W>(
    plan: &TransferPlan,
    seed: &mut S,
    remote: &mut R,
    output: &mut W,
    expected_sha1: &str,
    cancel: &CancellationFlag,
    mut progress: impl FnMut(ProgressEvent),
) -> Result<(), EngineError>
where
    S: ChunkSource,
    R: ChunkSource,
    W: Write,
{
    let total = plan.seed_bytes() + plan.remote_bytes();
    let mut hasher = Sha1Sum::new();
    let mut scratch = vec![0u8; COPY_BUFFER];
    let mut written = 0u64;

    for chunk in plan.chunks() {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        trace!(
            kind = ?chunk.kind,
            size = chunk.size,
            source_offset = chunk.source_offset,
            target_offset = chunk.target_offset,
            "merging chunk"
        );

        match chunk.kind {
            ChunkKind::Seed => {
                seed.seek_to(chunk.source_offset).map_err(EngineError::Seed)?;
            }
            ChunkKind::Remote => {
                remote
                    .seek_to(chunk.source_offset)
                    .map_err(EngineError::Remote)?;
                remote.prefetch(chunk.size).map_err(EngineError::Remote)?;
            }
        }

        let mut left = chunk.size;
        while left > 0 {
            let take = scratch.len().min(left as usize);
            let buf = &mut scratch[..take];
            match chunk.kind {
                ChunkKind::Seed => seed.read_full(buf).map_err(EngineError::Seed)?,
                ChunkKind::Remote => remote.read_full(buf).map_err(EngineError::Remote)?,
            }
            hasher.update(buf);
            output.write_all(buf)?;
            left -= take as u64;
        }

        written += chunk.size;
        progress(ProgressEvent::BytesWritten { written, total });
    }

    output.flush()?;

    let actual = hasher.finalize_hex();
    let expected = expected_sha1.to_ascii_lowercase();
    if actual != expected {
        return Err(EngineError::ChecksumMismatch { expected, actual });
    }

    debug!(bytes = total, "merge verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::plan::{Chunk, Planner};
    use crate::source::MemorySource;

    fn seed_chunk(source_offset: u64, target_offset: u64, size: u64) -> Chunk {
        Chunk {
            kind: ChunkKind::Seed,
            size,
            source_offset,
            target_offset,
        }
    }

    #[test]
    fn interleaves_seed_and_remote_chunks() {
        // Artifact: 6000 bytes; seed provides [2048, 4096), remote the rest.
        let artifact: Vec<u8> = (0..6000).map(|i| (i % 241) as u8).collect();
        let seed_data = artifact[2048..4096].to_vec();

        let plan = Planner::new(6000).plan(vec![seed_chunk(0, 2048, 2048)]);

        let mut seed = MemorySource::new(seed_data);
        let mut remote = MemorySource::new(artifact.clone());
        let mut output = Vec::new();

        merge_plan(
            &plan,
            &mut seed,
            &mut remote,
            &mut output,
            &test_support::sha1_hex(&artifact),
            &CancellationFlag::new(),
            |_| {},
        )
        .unwrap();

        assert_eq!(output, artifact);
    }

    #[test]
    fn uppercase_expected_digest_is_accepted() {
        let artifact = vec![0x42u8; 1000];
        let plan = Planner::new(1000).plan(Vec::new());

        let mut seed = MemorySource::default();
        let mut remote = MemorySource::new(artifact.clone());
        let mut output = Vec::new();

        merge_plan(
            &plan,
            &mut seed,
            &mut remote,
            &mut output,
            &test_support::sha1_hex(&artifact).to_ascii_uppercase(),
            &CancellationFlag::new(),
            |_| {},
        )
        .unwrap();
        assert_eq!(output, artifact);
    }

    #[test]
    fn wrong_remote_bytes_fail_verification() {
        let artifact = vec![0x42u8; 1000];
        let mut corrupted = artifact.clone();
        corrupted[500] ^= 0xff;

        let plan = Planner::new(1000).plan(Vec::new());
        let mut seed = MemorySource::default();
        let mut remote = MemorySource::new(corrupted);
        let mut output = Vec::new();

        let err = merge_plan(
            &plan,
            &mut seed,
            &mut remote,
            &mut output,
            &test_support::sha1_hex(&artifact),
            &CancellationFlag::new(),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ChecksumMismatch { .. }));
    }

    #[test]
    fn cancellation_stops_before_any_chunk() {
        let plan = Planner::new(1000).plan(Vec::new());
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let err = merge_plan(
            &plan,
            &mut MemorySource::default(),
            &mut MemorySource::new(vec![0u8; 1000]),
            &mut Vec::new(),
            "0000000000000000000000000000000000000000",
            &cancel,
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[test]
    fn progress_reports_cumulative_bytes() {
        let artifact = vec![7u8; 3000];
        let plan = Planner::new(3000).plan(vec![seed_chunk(0, 0, 2048)]);

        let mut events = Vec::new();
        merge_plan(
            &plan,
            &mut MemorySource::new(artifact[..2048].to_vec()),
            &mut MemorySource::new(artifact.clone()),
            &mut Vec::new(),
            &test_support::sha1_hex(&artifact),
            &CancellationFlag::new(),
            |event| events.push(event),
        )
        .unwrap();

        assert_eq!(
            events,
            vec![
                ProgressEvent::BytesWritten {
                    written: 2048,
                    total: 3000
                },
                ProgressEvent::BytesWritten {
                    written: 3000,
                    total: 3000
                },
            ]
        );
    }
}
