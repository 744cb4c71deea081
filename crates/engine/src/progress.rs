//! Progress reporting and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Events reported synchronously while an update attempt advances.
///
/// The scanner and merger invoke the caller's `FnMut(ProgressEvent)` on the
/// engine thread; handlers must not block, so anything expensive belongs on
/// the far side of a channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressEvent {
    /// The seed scanner examined more of the seed.
    SeedScanned {
        /// Seed bytes examined so far.
        scanned: u64,
        /// Total seed size.
        total: u64,
    },
    /// The merge driver finished writing a chunk.
    BytesWritten {
        /// Artifact bytes written so far.
        written: u64,
        /// Total artifact size.
        total: u64,
    },
}

/// Cooperative cancellation signal shared between the driver and its caller.
///
/// The engine checks the flag between chunks; on observation it abandons the
/// attempt with [`crate::EngineError::Cancelled`] and the surrounding
/// transaction rolls the filesystem back.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Creates a flag in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; safe to call from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_clear_and_latches() {
        let flag = CancellationFlag::new();
        assert!(!flag.is_cancelled());

        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
