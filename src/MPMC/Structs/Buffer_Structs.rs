// Framing structs carried by every slot, plus the splitter that produces them.

use crate::MPMC::Buffer::FRAGMENT_CAPACITY;

/// Framing metadata that precedes each fragment payload in a Slot.
/// Plain integral fields only; the layout is fixed by `#[repr(C)]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Length of the whole logical message this fragment belongs to.
    pub total_length: u64,
    /// Offset of this fragment's first byte within the logical message.
    pub fragment_offset: u64,
    /// Number of valid payload bytes in the slot.
    pub payload_len: u32,
    /// Reserved, always zero.
    pub flags: u32,
}

impl FragmentHeader {
    pub fn new(total_length: u64, fragment_offset: u64, payload_len: usize) -> Self {
        Self {
            total_length,
            fragment_offset,
            payload_len: payload_len as u32,
            flags: 0,
        }
    }

    /// Offset one past this fragment's last byte.
    #[inline]
    pub fn end_offset(&self) -> u64 {
        self.fragment_offset + self.payload_len as u64
    }

    /// True for the fragment that completes its message.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.end_offset() >= self.total_length
    }
}

/// Number of fragments a message of `len` bytes is split into.
///
/// An empty message still travels as one zero-length fragment.
pub fn fragment_count(len: usize) -> usize {
    len.div_ceil(FRAGMENT_CAPACITY).max(1)
}

/// Split `message` into slot-sized fragments, in order.
pub fn fragments(message: &[u8]) -> Fragments<'_> {
    Fragments::continuing(message, message.len() as u64, 0)
}

/// Iterator over `(header, payload)` pairs for one message, or for the
/// remainder of one that was partially committed earlier.
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    remaining: &'a [u8],
    total_length: u64,
    offset: u64,
    emit_empty: bool,
}

impl<'a> Fragments<'a> {
    /// Fragments for `remainder`, the bytes of a `total_length` message
    /// starting at `offset`.
    pub fn continuing(remainder: &'a [u8], total_length: u64, offset: u64) -> Self {
        Self {
            remaining: remainder,
            total_length,
            offset,
            emit_empty: total_length == 0,
        }
    }

    /// Offset of the next fragment this iterator will yield.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = (FragmentHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            if !self.emit_empty {
                return None;
            }
            self.emit_empty = false;
            return Some((FragmentHeader::new(0, 0, 0), &[]));
        }

        let len = self.remaining.len().min(FRAGMENT_CAPACITY);
        let (chunk, rest) = self.remaining.split_at(len);
        let header = FragmentHeader::new(self.total_length, self.offset, len);

        self.remaining = rest;
        self.offset += len as u64;
        Some((header, chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.remaining.is_empty() {
            usize::from(self.emit_empty)
        } else {
            self.remaining.len().div_ceil(FRAGMENT_CAPACITY)
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for Fragments<'_> {}

/// A message whose first fragments are committed but whose tail is not.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpenMessage {
    pub total_length: u64,
    pub next_offset: u64,
    /// Writer id of the handle that started the message.
    pub owner: u64,
}

impl OpenMessage {
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.total_length - self.next_offset
    }
}

/// Point-in-time view of a ring's cursors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RingStats {
    pub capacity: usize,
    /// Committed, unread slots.
    pub occupied: usize,
    pub read_index: u64,
    pub write_index: u64,
    /// Bytes still owed by a partially written message, if any.
    pub open_message_remaining: Option<u64>,
    /// Reads, writes and waits running when the snapshot was taken.
    pub in_flight: usize,
    pub destroyed: bool,
}
