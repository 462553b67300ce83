pub mod backoff;
pub mod error;
pub mod monitor;

pub use backoff::{Backoff, BackoffConfig, ReadPolicy, DEFAULT_RETRY_BUDGET};
pub use error::{RingError, RingResult};
pub use monitor::Monitor;
