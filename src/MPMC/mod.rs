mod builder;
mod consumer;
mod debug;
mod producer;
mod stream;

pub use builder::{RingBuilder, RingConfig, DEFAULT_CAPACITY};
pub use consumer::Consumer;
pub use producer::Producer;
pub use stream::{MessageStream, DEFAULT_POLL_INTERVAL};

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    mod reader;
    mod writer;
    pub use layout::RingStore;
    pub use Buffer::{RingBuffer, Slot, FRAGMENT_CAPACITY}; // re-export for stable path
}

pub mod Structs {
    pub mod Buffer_Structs;
    pub use Buffer_Structs::{fragment_count, fragments, FragmentHeader, Fragments, RingStats}; // re-export for stable path
}
