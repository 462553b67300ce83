//! Error types for the fragment ring.

use thiserror::Error;

/// Errors that can occur during ring operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// Construction requested with a zero slot count
    #[error("invalid capacity {0}: a ring needs at least one slot")]
    InvalidCapacity(usize),

    /// Allocating the slot storage failed
    #[error("failed to allocate {bytes} bytes of slot storage")]
    AllocationFailed { bytes: usize },

    /// A bounded read gave up (retry budget or deadline) while the ring stayed empty
    #[error("no data available")]
    NoDataAvailable,

    /// Operation on a handle whose ring has been destroyed
    #[error("ring buffer used after destroy")]
    UseAfterDestroy,

    /// A fragment larger than one slot reached the slot writer
    #[error("fragment too large: {len} bytes, max {max} bytes")]
    OversizedFragment { len: usize, max: usize },

    /// Destroy requested while reads or writes are still running
    #[error("ring buffer still has {in_flight} operation(s) in flight")]
    StillActive { in_flight: usize },

    /// Continuation of a partially written message is longer than what remains
    #[error("remainder of {len} bytes overruns open message ({remaining} bytes left)")]
    RemainderOverrun { remaining: u64, len: usize },

    /// A fragment does not continue the message being reassembled
    #[error("fragment out of order: expected offset {expected} of {total_length}, found offset {found} of {found_total}")]
    FragmentOutOfOrder {
        expected: u64,
        total_length: u64,
        found: u64,
        found_total: u64,
    },
}

impl RingError {
    /// Whether the caller can simply retry the operation.
    ///
    /// An empty ring and a destroy issued before quiescence are expected
    /// conditions. Everything else points at a lifecycle bug or a broken
    /// framing invariant.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RingError::NoDataAvailable | RingError::StillActive { .. }
        )
    }
}

/// Result type for ring operations.
pub type RingResult<T> = Result<T, RingError>;
