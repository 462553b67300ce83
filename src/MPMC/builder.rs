use std::time::Duration;

use super::{Consumer, Producer};
use crate::Core::backoff::{BackoffConfig, ReadPolicy};
use crate::Core::error::RingResult;
use crate::MPMC::Buffer::RingBuffer;

/// Default slot count: 64 slots of 64 KiB, 4 MiB of payload storage.
pub const DEFAULT_CAPACITY: usize = 64;

/// Construction-time configuration of a ring. Fixed for its lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RingConfig {
    /// Number of slots.
    pub capacity: usize,
    /// How `read()` waits on an empty ring.
    pub read_policy: ReadPolicy,
    /// Delay bounds for the backoff read policies.
    pub backoff: BackoffConfig,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            read_policy: ReadPolicy::default(),
            backoff: BackoffConfig::default(),
        }
    }
}

#[derive(Default)]
pub struct RingBuilder {
    config: RingConfig,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.config.read_policy = policy;
        self
    }

    pub fn with_backoff(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.config.backoff = BackoffConfig::new(min_delay, max_delay);
        self
    }

    pub fn build(self) -> RingResult<RingBuffer> {
        RingBuffer::with_config(self.config)
    }

    pub fn build_producer(self) -> RingResult<Producer> {
        Ok(self.build()?.producer())
    }

    pub fn build_consumer(self) -> RingResult<Consumer> {
        Ok(self.build()?.consumer())
    }
}
