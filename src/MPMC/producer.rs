// In src/MPMC/producer.rs
use crate::Core::error::RingResult;
use crate::MPMC::Buffer::RingBuffer;
use std::sync::atomic::{AtomicU64, Ordering};

/// A producer for sending messages through a ring.
///
/// Any number of producers may share one ring. Each `send` owns the ring's
/// write side for the whole message, so messages never interleave.
pub struct Producer {
    ring: RingBuffer,
    messages_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl Producer {
    pub(crate) fn new(ring: RingBuffer) -> Self {
        Self {
            ring,
            messages_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// Sends a message, waiting for free slots as long as it takes.
    ///
    /// # Arguments
    /// * `message` - The message to send, of any length
    ///
    /// # Returns
    /// * `Ok(())` once the last fragment is committed
    /// * `Err(RingError::UseAfterDestroy)` if the ring has been destroyed
    pub fn send<T: AsRef<[u8]>>(&self, message: T) -> RingResult<()> {
        let message = message.as_ref();
        self.ring.write_full(message)?;
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(message.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Commits as much of a message as fits without waiting.
    ///
    /// Returns the bytes committed. A short count leaves the message open;
    /// pass the remainder to the next `try_send` or `send`.
    pub fn try_send<T: AsRef<[u8]>>(&self, message: T) -> RingResult<usize> {
        let commit = self.ring.try_commit(message.as_ref())?;
        if commit.complete {
            self.messages_sent.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_sent
            .fetch_add(commit.bytes as u64, Ordering::Relaxed);
        Ok(commit.bytes)
    }

    /// Returns the number of messages whose last fragment this producer committed
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of payload bytes committed by this producer
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Returns the ring this producer writes to
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }
}
