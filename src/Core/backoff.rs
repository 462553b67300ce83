use std::time::Duration;

/// Default number of empty polls a bounded read makes before giving up.
pub const DEFAULT_RETRY_BUDGET: u32 = 1000;

/// Bounds of the exponential backoff used while polling an empty ring.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// First delay after an empty poll.
    pub min_delay: Duration,
    /// Delay cap. Once reached, every further retry waits this long.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_micros(1),
            max_delay: Duration::from_millis(1),
        }
    }
}

impl BackoffConfig {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// Start a fresh backoff sequence.
    pub fn start(&self) -> Backoff {
        Backoff {
            next: self.min_delay,
            max: self.max_delay,
        }
    }
}

/// A running backoff sequence: min, 2*min, 4*min, ... capped at max.
#[derive(Debug)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    /// Returns the delay to sleep now and advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }
}

/// How a read waits while the ring has no fragment for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Sleep on the data signal until a producer commits a fragment.
    Block,
    /// Poll with exponential backoff, forever.
    #[default]
    Backoff,
    /// Poll with exponential backoff, failing with `NoDataAvailable` after
    /// `attempts` empty observations.
    BoundedRetry { attempts: u32 },
}

impl ReadPolicy {
    /// Bounded retry with the default budget.
    pub fn bounded() -> Self {
        ReadPolicy::BoundedRetry {
            attempts: DEFAULT_RETRY_BUDGET,
        }
    }
}
