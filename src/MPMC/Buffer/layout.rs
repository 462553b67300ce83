use super::Buffer::Slot;
use crate::Core::error::{RingError, RingResult};
use crate::MPMC::Structs::Buffer_Structs::{FragmentHeader, OpenMessage, RingStats};

/// The ring store: a fixed array of slots and two monotonically advancing cursors.
///
/// `write_index - read_index` is always within `[0, capacity]`; equal
/// cursors mean empty, a difference of `capacity` means full. The physical
/// slot for a cursor value is `index % capacity`.
///
/// Only ever touched through the `Monitor` guard.
pub struct RingStore {
    slots: Box<[Slot]>,

    /// Slot count, fixed for the lifetime of the store.
    capacity: usize,

    /// Next cursor value a consumer will read.
    read_index: u64,

    /// Next cursor value a producer will write.
    write_index: u64,

    /// Message whose leading fragments are committed but whose tail is not.
    pub(crate) open: Option<OpenMessage>,

    destroyed: bool,
}

impl RingStore {
    /// Allocate `capacity` zeroed slots and reset both cursors.
    pub fn with_capacity(capacity: usize) -> RingResult<Self> {
        if capacity == 0 {
            return Err(RingError::InvalidCapacity(capacity));
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| RingError::AllocationFailed {
                bytes: capacity.saturating_mul(std::mem::size_of::<Slot>()),
            })?;
        for _ in 0..capacity {
            slots.push(Slot::try_new()?);
        }

        Ok(Self {
            slots: slots.into_boxed_slice(),
            capacity,
            read_index: 0,
            write_index: 0,
            open: None,
            destroyed: false,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Committed, unread slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.write_index.wrapping_sub(self.read_index) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_index == self.write_index
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// True while a message started by a writer other than `writer` is open.
    #[inline]
    pub(crate) fn is_open_for_other(&self, writer: u64) -> bool {
        self.open.is_some_and(|open| open.owner != writer)
    }

    #[inline]
    fn slot_index(&self, index: u64) -> usize {
        (index % self.capacity as u64) as usize
    }

    /// Write one fragment into the slot at `write_index` and advance it.
    /// Caller must have checked `!is_full()`.
    pub(crate) fn push(&mut self, header: FragmentHeader, payload: &[u8]) -> RingResult<()> {
        debug_assert!(!self.is_full(), "push into a full ring");
        let idx = self.slot_index(self.write_index);
        self.slots[idx].store(header, payload)?;
        self.write_index = self.write_index.wrapping_add(1);
        Ok(())
    }

    /// The slot at `read_index`, if anything is committed.
    #[inline]
    pub(crate) fn front(&self) -> Option<&Slot> {
        if self.is_empty() {
            return None;
        }
        Some(&self.slots[self.slot_index(self.read_index)])
    }

    /// Release the slot at `read_index` back to producers.
    #[inline]
    pub(crate) fn advance_read(&mut self) {
        debug_assert!(!self.is_empty(), "advance past write cursor");
        self.read_index = self.read_index.wrapping_add(1);
    }

    /// Headers of committed, unread fragments in FIFO order.
    pub(crate) fn pending_headers(&self) -> Vec<FragmentHeader> {
        (0..self.len() as u64)
            .map(|i| self.slots[self.slot_index(self.read_index.wrapping_add(i))].header)
            .collect()
    }

    /// Drop the slot storage. The store is unusable afterwards.
    pub(crate) fn release(&mut self) {
        self.slots = Box::default();
        self.open = None;
        self.destroyed = true;
    }

    pub fn stats(&self) -> RingStats {
        RingStats {
            capacity: self.capacity,
            occupied: self.len(),
            read_index: self.read_index,
            write_index: self.write_index,
            open_message_remaining: self.open.map(|open| open.remaining()),
            in_flight: 0,
            destroyed: self.destroyed,
        }
    }
}
