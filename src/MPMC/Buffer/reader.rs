use std::thread;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;
use tracing::{debug, error, trace};

use super::layout::RingStore;
use super::Buffer::{RingBuffer, Slot};
use crate::Core::backoff::ReadPolicy;
use crate::Core::error::{RingError, RingResult};

/// How one wait for a fragment behaves.
#[derive(Copy, Clone, Debug)]
enum Wait {
    Signal,
    Backoff { attempts: Option<u32> },
    Until(Instant),
}

impl Wait {
    /// The same waiting style without a budget or deadline. Used once a
    /// message has started, so it is never abandoned half-read.
    fn unbounded(self) -> Self {
        match self {
            Wait::Backoff { .. } => Wait::Backoff { attempts: None },
            Wait::Signal | Wait::Until(_) => Wait::Signal,
        }
    }
}

impl From<ReadPolicy> for Wait {
    fn from(policy: ReadPolicy) -> Self {
        match policy {
            ReadPolicy::Block => Wait::Signal,
            ReadPolicy::Backoff => Wait::Backoff { attempts: None },
            ReadPolicy::BoundedRetry { attempts } => Wait::Backoff {
                attempts: Some(attempts),
            },
        }
    }
}

/// Accumulation buffer for one logical message.
#[derive(Default)]
struct Assembly {
    /// Set by the first fragment consumed.
    total_length: Option<u64>,
    bytes: Vec<u8>,
}

impl Assembly {
    fn is_started(&self) -> bool {
        self.total_length.is_some()
    }

    fn is_complete(&self) -> bool {
        self.total_length
            .is_some_and(|total| self.bytes.len() as u64 >= total)
    }

    /// Append the fragment in `slot`, checking it continues this message.
    fn append(&mut self, slot: &Slot) -> RingResult<()> {
        let header = slot.header;
        let expected = self.bytes.len() as u64;
        let total_length = *self.total_length.get_or_insert(header.total_length);

        if header.total_length != total_length || header.fragment_offset != expected {
            return Err(RingError::FragmentOutOfOrder {
                expected,
                total_length,
                found: header.fragment_offset,
                found_total: header.total_length,
            });
        }

        if self.bytes.capacity() < total_length as usize {
            self.bytes.reserve_exact(total_length as usize - self.bytes.len());
        }
        self.bytes.extend_from_slice(slot.payload());
        Ok(())
    }

    fn finish(mut self) -> Vec<u8> {
        if let Some(total) = self.total_length {
            self.bytes.truncate(total as usize);
        }
        self.bytes
    }
}

impl RingBuffer {
    /// Receive one complete message, waiting per the configured `ReadPolicy`.
    pub fn read(&self) -> RingResult<Vec<u8>> {
        self.read_with(self.shared.config.read_policy)
    }

    /// Receive one complete message, waiting per `policy`.
    pub fn read_with(&self, policy: ReadPolicy) -> RingResult<Vec<u8>> {
        self.receive(Wait::from(policy))
    }

    /// Receive one complete message, failing with `NoDataAvailable` if no
    /// message starts within `timeout`.
    pub fn read_timeout(&self, timeout: Duration) -> RingResult<Vec<u8>> {
        self.receive(Wait::Until(Instant::now() + timeout))
    }

    /// Receive one message if one has started arriving, without waiting for
    /// it to start. Fails with `NoDataAvailable` if another reader holds the ring.
    pub fn try_read(&self) -> RingResult<Vec<u8>> {
        self.read_with(ReadPolicy::BoundedRetry { attempts: 1 })
    }

    /// Take the read gate, giving up on the same terms as the empty-ring wait.
    fn claim_reader(&self, wait: Wait) -> RingResult<MutexGuard<'_, ()>> {
        let gate = &self.shared.read_gate;
        match wait {
            Wait::Signal | Wait::Backoff { attempts: None } => Ok(gate.lock()),
            Wait::Until(deadline) => gate.try_lock_until(deadline).ok_or_else(|| {
                debug!("read deadline passed waiting for another reader");
                RingError::NoDataAvailable
            }),
            Wait::Backoff {
                attempts: Some(budget),
            } => {
                let mut backoff = self.shared.config.backoff.start();
                let mut polls = 1u32;
                loop {
                    if let Some(guard) = gate.try_lock() {
                        return Ok(guard);
                    }
                    if polls >= budget {
                        debug!(polls, "read retry budget exhausted waiting for another reader");
                        return Err(RingError::NoDataAvailable);
                    }
                    polls += 1;
                    if let Some(guard) = gate.try_lock_for(backoff.next_delay()) {
                        return Ok(guard);
                    }
                }
            }
        }
    }

    fn receive(&self, wait: Wait) -> RingResult<Vec<u8>> {
        let _reader = self.claim_reader(wait)?;
        let (_flight, mut state) = self.enter("read")?;
        let mut assembly = Assembly::default();

        loop {
            let mut drained = 0usize;
            let mut outcome = Ok(());
            while !assembly.is_complete() {
                let Some(slot) = state.front() else {
                    break;
                };
                outcome = assembly.append(slot);
                if outcome.is_err() {
                    break;
                }
                state.advance_read();
                drained += 1;
            }
            if drained > 0 {
                self.shared.monitor.signal_space();
            }
            if let Err(err) = outcome {
                error!(error = %err, "fragment framing violated, message dropped");
                return Err(err);
            }

            if assembly.is_complete() {
                return Ok(assembly.finish());
            }

            let wait = if assembly.is_started() {
                wait.unbounded()
            } else {
                wait
            };
            self.await_fragment(&mut state, wait)?;
        }
    }

    /// Wait until the store is non-empty, releasing the lock while waiting.
    fn await_fragment(&self, state: &mut MutexGuard<'_, RingStore>, wait: Wait) -> RingResult<()> {
        match wait {
            Wait::Signal => {
                if state.is_empty() {
                    trace!("ring empty, waiting for signal");
                }
                self.shared.monitor.wait_data_while(state, |s| s.is_empty());
                Ok(())
            }
            Wait::Until(deadline) => {
                let timed_out =
                    self.shared
                        .monitor
                        .wait_data_while_until(state, |s| s.is_empty(), deadline);
                if timed_out {
                    debug!("read deadline passed with ring empty");
                    return Err(RingError::NoDataAvailable);
                }
                Ok(())
            }
            Wait::Backoff { attempts } => {
                let mut backoff = self.shared.config.backoff.start();
                let mut empty_polls = 0u32;
                while state.is_empty() {
                    empty_polls += 1;
                    if attempts.is_some_and(|budget| empty_polls >= budget) {
                        debug!(empty_polls, "read retry budget exhausted");
                        return Err(RingError::NoDataAvailable);
                    }
                    let delay = backoff.next_delay();
                    MutexGuard::unlocked(state, || thread::sleep(delay));
                }
                Ok(())
            }
        }
    }
}
