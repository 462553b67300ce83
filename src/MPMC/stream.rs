//! Channel adapter: a background thread that drains a ring message by message.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{
    bounded, Iter, Receiver, RecvError, RecvTimeoutError, SendTimeoutError, Sender,
    TryRecvError,
};
use tracing::{debug, error};

use crate::Core::error::{RingError, RingResult};
use crate::MPMC::Buffer::RingBuffer;

/// How long the reader thread waits for a message before re-checking `stop`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Messages from a ring, delivered through a bounded channel.
///
/// The stream owns its reader thread. It must be stopped (or dropped) before
/// the ring is destroyed; while it runs, `destroy` fails with `StillActive`.
/// A message already half-read when `stop` is called is finished first.
pub struct MessageStream {
    receiver: Receiver<Vec<u8>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<RingResult<()>>>,
}

impl MessageStream {
    /// Start a reader thread over `ring` with room for `depth` undelivered messages.
    pub fn spawn(ring: RingBuffer, depth: usize, poll: Duration) -> io::Result<Self> {
        let (sender, receiver) = bounded(depth.max(1));
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);

        let worker = thread::Builder::new()
            .name("fragring-stream".into())
            .spawn(move || pump(ring, sender, worker_stop, poll))?;

        Ok(Self {
            receiver,
            stop,
            worker: Some(worker),
        })
    }

    /// Next message, blocking. Fails once the reader has stopped and the
    /// channel is drained.
    pub fn recv(&self) -> Result<Vec<u8>, RecvError> {
        self.receiver.recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Vec<u8>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<Vec<u8>, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Blocking iterator over messages, ending when the reader stops.
    pub fn iter(&self) -> Iter<'_, Vec<u8>> {
        self.receiver.iter()
    }

    /// Messages read from the ring but not yet received.
    pub fn buffered(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the reader thread is still running.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the reader thread and wait for it.
    ///
    /// Returns the ring error that stopped the reader early, if any.
    pub fn stop(mut self) -> RingResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> RingResult<()> {
        self.stop.store(true, Ordering::Release);
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        match worker.join() {
            Ok(result) => result,
            Err(_) => {
                error!("stream reader thread panicked");
                Ok(())
            }
        }
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn pump(
    ring: RingBuffer,
    sender: Sender<Vec<u8>>,
    stop: Arc<AtomicBool>,
    poll: Duration,
) -> RingResult<()> {
    while !stop.load(Ordering::Acquire) {
        let mut message = match ring.read_timeout(poll) {
            Ok(message) => message,
            Err(RingError::NoDataAvailable) => continue,
            Err(err) => {
                error!(error = %err, "stream reader stopped");
                return Err(err);
            }
        };

        loop {
            match sender.send_timeout(message, poll) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(pending)) => {
                    if stop.load(Ordering::Acquire) {
                        debug!("stream stopped with an undelivered message");
                        return Ok(());
                    }
                    message = pending;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    debug!("stream receiver dropped");
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}
