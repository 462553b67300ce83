// This is the shared slot ring - one lock over the cursors and every slot

use super::layout::RingStore;
use crate::Core::error::{RingError, RingResult};
use crate::Core::monitor::Monitor;
use crate::MPMC::builder::RingConfig;
use crate::MPMC::Structs::Buffer_Structs::FragmentHeader;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// The payload capacity of one slot, in bytes.
/// Messages longer than this are split across consecutive slots.
pub const FRAGMENT_CAPACITY: usize = 64 * 1024;

/// A single slot in the ring.
///
/// Holds one fragment of one logical message. The payload buffer is
/// allocated once, at full `FRAGMENT_CAPACITY`, and reused for every
/// fragment that passes through the slot.
#[repr(C, align(64))]
pub struct Slot {
    /// Framing for the fragment currently stored.
    pub header: FragmentHeader,

    /// Backing storage; only the first `header.payload_len` bytes are meaningful.
    payload: Box<[u8]>,
}

impl Slot {
    /// Allocate a zeroed slot, reporting allocation failure instead of aborting.
    pub(crate) fn try_new() -> RingResult<Self> {
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(FRAGMENT_CAPACITY)
            .map_err(|_| RingError::AllocationFailed {
                bytes: FRAGMENT_CAPACITY,
            })?;
        payload.resize(FRAGMENT_CAPACITY, 0);

        Ok(Self {
            header: FragmentHeader::default(),
            payload: payload.into_boxed_slice(),
        })
    }

    /// The valid bytes of the stored fragment.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.header.payload_len as usize]
    }

    /// Overwrite this slot with a new fragment.
    pub(crate) fn store(&mut self, header: FragmentHeader, bytes: &[u8]) -> RingResult<()> {
        if bytes.len() > FRAGMENT_CAPACITY || header.payload_len as usize != bytes.len() {
            return Err(RingError::OversizedFragment {
                len: bytes.len(),
                max: FRAGMENT_CAPACITY,
            });
        }
        self.payload[..bytes.len()].copy_from_slice(bytes);
        self.header = header;
        Ok(())
    }
}

/// State shared by every clone of a `RingBuffer` handle.
pub(crate) struct Shared {
    /// Cursors and slots, plus the data/space signals bound to their lock.
    pub(crate) monitor: Monitor<RingStore>,

    /// Held by a writer for the whole of one logical message, so fragments
    /// of two messages never interleave.
    pub(crate) write_gate: Mutex<()>,

    /// Held by a reader for the whole of one logical message, so two readers
    /// never split one message between them.
    pub(crate) read_gate: Mutex<()>,

    /// Reads, writes and waits currently running against the ring.
    pub(crate) in_flight: AtomicUsize,

    /// Source of per-handle writer ids.
    pub(crate) next_writer: AtomicU64,

    pub(crate) config: RingConfig,
}

/// A bounded, slot-based ring that carries byte messages of any length.
///
/// This is a cheap, clonable handle. All clones refer to the same ring, but
/// each clone is its own writer: a message left open by a partial `write`
/// can only be continued through the handle that started it.
///
/// ### Concurrency Design:
/// - **Producers (write)**: take the write gate for one message, then commit
///   fragments under the state lock. When the ring is full they park on the
///   "space ready" condition, which releases the lock.
/// - **Consumers (read)**: take the read gate for one message, then drain
///   fragments under the state lock, waiting (signal or backoff, per policy)
///   whenever the ring is empty. The lock is never held while sleeping.
pub struct RingBuffer {
    pub(crate) shared: Arc<Shared>,
    pub(crate) writer_id: u64,
}

impl Clone for RingBuffer {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            writer_id: self.shared.next_writer.fetch_add(1, Ordering::Relaxed),
        }
    }
}
