use parking_lot::MutexGuard;
use tracing::trace;

use super::layout::RingStore;
use super::Buffer::RingBuffer;
use super::Buffer_impl::InFlight;
use crate::Core::error::{RingError, RingResult};
use crate::MPMC::Structs::Buffer_Structs::{Fragments, OpenMessage};

/// What a single pass of the writer managed to commit.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Commit {
    pub(crate) bytes: usize,
    pub(crate) fragments: usize,
    /// Every fragment of the caller's slice is in the ring.
    pub(crate) complete: bool,
    /// This pass closed a message that an earlier pass left open.
    pub(crate) closed_open: bool,
}

impl RingStore {
    /// Commit as many fragments of `message` as currently fit, on behalf of `writer`.
    ///
    /// If a previous pass by `writer` left a message open, `message` is its
    /// remainder: fragments keep the original `total_length` and continue
    /// its offsets. Callers must have checked `!is_open_for_other(writer)`.
    pub(crate) fn commit(&mut self, message: &[u8], writer: u64) -> RingResult<Commit> {
        debug_assert!(!self.is_open_for_other(writer), "commit into a foreign open message");
        let was_open = self.open.is_some();
        let (total_length, offset) = match self.open {
            Some(open) => {
                if message.len() as u64 > open.remaining() {
                    return Err(RingError::RemainderOverrun {
                        remaining: open.remaining(),
                        len: message.len(),
                    });
                }
                (open.total_length, open.next_offset)
            }
            None => (message.len() as u64, 0),
        };

        let mut pieces = Fragments::continuing(message, total_length, offset);
        let mut commit = Commit::default();

        while !self.is_full() {
            let Some((header, payload)) = pieces.next() else {
                break;
            };
            self.push(header, payload)?;
            commit.bytes += payload.len();
            commit.fragments += 1;
        }

        // Open state only moves when something was committed.
        if commit.fragments > 0 {
            let next_offset = pieces.offset();
            self.open = (next_offset < total_length).then_some(OpenMessage {
                total_length,
                next_offset,
                owner: writer,
            });
        }
        commit.complete = pieces.len() == 0;
        commit.closed_open = was_open && self.open.is_none();
        Ok(commit)
    }
}

impl RingBuffer {
    /// Commit as much of `message` as fits right now, without waiting for space.
    ///
    /// Returns the number of bytes committed. When that is less than
    /// `message.len()`, the message stays open and the next `write` or
    /// `write_full` call on this handle must pass the remainder. Returns
    /// `Ok(0)` without committing anything if another writer is in the
    /// middle of a message.
    pub fn write(&self, message: &[u8]) -> RingResult<usize> {
        self.try_commit(message).map(|commit| commit.bytes)
    }

    pub(crate) fn try_commit(&self, message: &[u8]) -> RingResult<Commit> {
        let Some(_writer) = self.shared.write_gate.try_lock() else {
            trace!(len = message.len(), "write gate busy");
            return Ok(Commit::default());
        };
        let (_flight, mut state) = self.enter("write")?;
        if state.is_open_for_other(self.writer_id) {
            trace!(len = message.len(), "another writer's message is open");
            return Ok(Commit::default());
        }
        let commit = state.commit(message, self.writer_id)?;
        drop(state);

        self.publish(&commit);
        if !commit.complete {
            trace!(
                committed = commit.bytes,
                len = message.len(),
                "ring full, partial write"
            );
        }
        Ok(commit)
    }

    /// Commit all of `message`, waiting for consumers to free slots as needed.
    ///
    /// A message may need many times more fragments than the ring has slots;
    /// the producer and consumers interleave until the last fragment is in.
    /// If another handle has a message open, waits for it to be finished
    /// first. There is no timeout.
    pub fn write_full(&self, message: &[u8]) -> RingResult<()> {
        let (_writer, _flight, mut state) = self.claim_writer()?;

        let mut written = 0;
        loop {
            let commit = state.commit(&message[written..], self.writer_id)?;
            written += commit.bytes;

            self.publish(&commit);
            if commit.complete {
                return Ok(());
            }

            trace!(written, len = message.len(), "ring full, waiting for space");
            self.shared
                .monitor
                .wait_space_while(&mut state, |s| s.is_full());
        }
    }

    /// Take the write gate with no other handle's message open.
    ///
    /// The gate is released while waiting so the owner of the open message
    /// can take it and finish.
    fn claim_writer(
        &self,
    ) -> RingResult<(MutexGuard<'_, ()>, InFlight<'_>, MutexGuard<'_, RingStore>)> {
        let writer = self.writer_id;
        loop {
            let gate = self.shared.write_gate.lock();
            let (flight, mut state) = self.enter("write_full")?;
            if !state.is_open_for_other(writer) {
                return Ok((gate, flight, state));
            }
            drop(gate);

            trace!(writer, "another writer's message is open, waiting");
            self.shared
                .monitor
                .wait_space_while(&mut state, |s| s.is_open_for_other(writer));
        }
    }

    fn publish(&self, commit: &Commit) {
        if commit.fragments > 0 {
            self.shared.monitor.signal_data();
        }
        // Writers parked in `claim_writer` wait on the space condition.
        if commit.closed_open {
            self.shared.monitor.signal_space();
        }
    }
}
