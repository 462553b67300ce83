// src/MPMC/consumer.rs

use crate::Core::backoff::ReadPolicy;
use crate::Core::error::RingResult;
use crate::MPMC::Buffer::RingBuffer;
use crate::MPMC::stream::{MessageStream, DEFAULT_POLL_INTERVAL};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A consumer for receiving reassembled messages from a ring.
///
/// Several consumers may share one ring; each message goes to exactly one
/// of them, start to finish.
pub struct Consumer {
    ring: RingBuffer,
    messages_received: AtomicU64,
    bytes_received: AtomicU64,
}

impl Consumer {
    pub(crate) fn new(ring: RingBuffer) -> Self {
        Self {
            ring,
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
        }
    }

    fn record(&self, message: Vec<u8>) -> Vec<u8> {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(message.len() as u64, Ordering::Relaxed);
        message
    }

    /// Receives one message, waiting per the ring's configured read policy.
    ///
    /// # Returns
    /// * `Ok(data)` with the complete message
    /// * `Err(RingError::NoDataAvailable)` if a bounded policy gave up
    /// * `Err(RingError::UseAfterDestroy)` if the ring has been destroyed
    pub fn receive(&self) -> RingResult<Vec<u8>> {
        self.ring.read().map(|m| self.record(m))
    }

    /// Receives one message, waiting per `policy` instead of the ring default.
    pub fn receive_with(&self, policy: ReadPolicy) -> RingResult<Vec<u8>> {
        self.ring.read_with(policy).map(|m| self.record(m))
    }

    /// Receives one message, waiting up to `timeout` for it to start.
    pub fn receive_timeout(&self, timeout: Duration) -> RingResult<Vec<u8>> {
        self.ring.read_timeout(timeout).map(|m| self.record(m))
    }

    /// Hands this consumer's ring to a background reader feeding a channel.
    pub fn into_stream(self, depth: usize) -> std::io::Result<MessageStream> {
        MessageStream::spawn(self.ring, depth, DEFAULT_POLL_INTERVAL)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Returns the ring this consumer reads from
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }
}
