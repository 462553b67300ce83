use std::sync::atomic::{AtomicU64, AtomicUsize};
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use super::layout::RingStore;
use super::Buffer::{RingBuffer, Shared, FRAGMENT_CAPACITY};
use crate::Core::error::{RingError, RingResult};
use crate::Core::monitor::Monitor;
use crate::MPMC::builder::{RingBuilder, RingConfig};
use crate::MPMC::Structs::Buffer_Structs::{FragmentHeader, RingStats};
use crate::MPMC::{Consumer, Producer};

/// Marks one read/write/wait as running against the ring until dropped.
pub(crate) struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Release);
    }
}

impl RingBuffer {
    /// Create a ring of `capacity` slots with the default configuration.
    pub fn new(capacity: usize) -> RingResult<Self> {
        RingBuilder::new().with_capacity(capacity).build()
    }

    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }

    pub(crate) fn with_config(config: RingConfig) -> RingResult<Self> {
        let store = RingStore::with_capacity(config.capacity)?;

        debug!(
            capacity = config.capacity,
            fragment_capacity = FRAGMENT_CAPACITY,
            read_policy = ?config.read_policy,
            "ring buffer created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                monitor: Monitor::new(store),
                write_gate: Mutex::new(()),
                read_gate: Mutex::new(()),
                in_flight: AtomicUsize::new(0),
                next_writer: AtomicU64::new(1),
                config,
            }),
            writer_id: 0,
        })
    }

    /// Lock the store for an operation, refusing if the ring was destroyed.
    ///
    /// The in-flight mark is taken under the lock, so `destroy` either sees
    /// it or the operation sees `destroyed`.
    pub(crate) fn enter(
        &self,
        op: &'static str,
    ) -> RingResult<(InFlight<'_>, MutexGuard<'_, RingStore>)> {
        let state = self.shared.monitor.acquire();
        if state.is_destroyed() {
            error!(op, "ring buffer used after destroy");
            return Err(RingError::UseAfterDestroy);
        }
        self.shared.in_flight.fetch_add(1, AcqRel);
        Ok((InFlight(&self.shared.in_flight), state))
    }

    /// Release the slot storage.
    ///
    /// Fails with `StillActive` if any read, write or wait is running, and
    /// with `UseAfterDestroy` if the ring is already destroyed. Other clones
    /// of this handle observe `UseAfterDestroy` from then on.
    pub fn destroy(&self) -> RingResult<()> {
        let mut state = self.shared.monitor.acquire();
        if state.is_destroyed() {
            error!("ring buffer destroyed twice");
            return Err(RingError::UseAfterDestroy);
        }

        let in_flight = self.shared.in_flight.load(Acquire);
        if in_flight > 0 {
            warn!(in_flight, "destroy refused, ring buffer still in use");
            return Err(RingError::StillActive { in_flight });
        }

        let stats = state.stats();
        state.release();
        drop(state);

        self.shared.monitor.signal_data();
        self.shared.monitor.signal_space();
        info!(
            capacity = stats.capacity,
            unread = stats.occupied,
            "ring buffer destroyed"
        );
        Ok(())
    }

    /// Block until at least one fragment is committed.
    pub fn wait_for_data(&self) -> RingResult<()> {
        let (_flight, mut state) = self.enter("wait_for_data")?;
        self.shared
            .monitor
            .wait_data_while(&mut state, |s| s.is_empty());
        Ok(())
    }

    /// Block until at least one fragment is committed or `timeout` passes.
    ///
    /// Returns `Ok(false)` on timeout.
    pub fn wait_for_data_timeout(&self, timeout: Duration) -> RingResult<bool> {
        let deadline = Instant::now() + timeout;
        let (_flight, mut state) = self.enter("wait_for_data")?;
        let timed_out = self
            .shared
            .monitor
            .wait_data_while_until(&mut state, |s| s.is_empty(), deadline);
        Ok(!timed_out)
    }

    /// Headers of committed, unread fragments, oldest first.
    pub fn pending_fragments(&self) -> RingResult<Vec<FragmentHeader>> {
        let (_flight, state) = self.enter("pending_fragments")?;
        Ok(state.pending_headers())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.config.capacity
    }

    /// Committed, unread slots.
    pub fn len(&self) -> usize {
        self.shared.monitor.acquire().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.monitor.acquire().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.monitor.acquire().is_full()
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.monitor.acquire().is_destroyed()
    }

    pub fn stats(&self) -> RingStats {
        let state = self.shared.monitor.acquire();
        RingStats {
            in_flight: self.shared.in_flight.load(Acquire),
            ..state.stats()
        }
    }

    pub fn config(&self) -> &RingConfig {
        &self.shared.config
    }

    /// A producer role handle over this ring.
    pub fn producer(&self) -> Producer {
        Producer::new(self.clone())
    }

    /// A consumer role handle over this ring.
    pub fn consumer(&self) -> Consumer {
        Consumer::new(self.clone())
    }
}
