// Module naming follows project convention (MPMC = Multi-Producer Multi-Consumer)
#[allow(non_snake_case)]
pub mod MPMC;
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Debug;

pub use Core::{BackoffConfig, ReadPolicy, RingError, RingResult, DEFAULT_RETRY_BUDGET};
pub use MPMC::Buffer::{RingBuffer, FRAGMENT_CAPACITY};
pub use MPMC::Structs::{fragment_count, fragments, FragmentHeader, RingStats};
pub use MPMC::{Consumer, MessageStream, Producer, RingBuilder, RingConfig};
