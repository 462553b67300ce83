// Monitor pattern: one mutex over the shared state, two conditions bound to it.
// Waiters always re-check their predicate after waking; every notify is a broadcast.

use crossbeam_utils::CachePadded;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

/// Exclusive access to `T` plus "data ready" / "space ready" signals.
///
/// Both condition variables must only ever be waited on with the guard of
/// `state`; parking_lot panics if a condvar is paired with two mutexes.
pub struct Monitor<T> {
    state: CachePadded<Mutex<T>>,
    data_ready: Condvar,
    space_ready: Condvar,
}

impl<T> Monitor<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: CachePadded::new(Mutex::new(state)),
            data_ready: Condvar::new(),
            space_ready: Condvar::new(),
        }
    }

    /// Lock the state. Released when the guard drops, on every exit path.
    #[inline]
    pub fn acquire(&self) -> MutexGuard<'_, T> {
        self.state.lock()
    }

    /// Lock the state only if nobody else holds it.
    #[inline]
    pub fn try_acquire(&self) -> Option<MutexGuard<'_, T>> {
        self.state.try_lock()
    }

    /// Wake every consumer parked on the data condition.
    #[inline]
    pub fn signal_data(&self) -> usize {
        self.data_ready.notify_all()
    }

    /// Wake every producer parked on the space condition.
    #[inline]
    pub fn signal_space(&self) -> usize {
        self.space_ready.notify_all()
    }

    /// Park until `blocked` returns false. Returns immediately if it already is.
    pub fn wait_data_while<F>(&self, guard: &mut MutexGuard<'_, T>, blocked: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.data_ready.wait_while(guard, blocked);
    }

    /// Like `wait_data_while`, giving up at `deadline`.
    ///
    /// Returns `true` if the deadline passed with `blocked` still holding.
    pub fn wait_data_while_until<F>(
        &self,
        guard: &mut MutexGuard<'_, T>,
        mut blocked: F,
        deadline: Instant,
    ) -> bool
    where
        F: FnMut(&mut T) -> bool,
    {
        let result = self.data_ready.wait_while_until(guard, &mut blocked, deadline);
        result.timed_out() && blocked(&mut **guard)
    }

    /// Park until `blocked` returns false on the space condition.
    pub fn wait_space_while<F>(&self, guard: &mut MutexGuard<'_, T>, blocked: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.space_ready.wait_while(guard, blocked);
    }
}
