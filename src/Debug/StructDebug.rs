use std::fmt;
use std::sync::atomic::Ordering;

use crate::MPMC::Buffer::{RingBuffer, Slot};
use crate::MPMC::{Consumer, MessageStream, Producer};

/// Debug function for RingBuffer
///
/// Shows the configuration and, if the lock is free, a snapshot of the
/// cursors. Never blocks: a held lock is reported as `<locked>`.
pub fn debug_ring_buffer(ring: &RingBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut s = f.debug_struct("RingBuffer");
    s.field("config", ring.config());
    s.field("writer_id", &ring.writer_id);
    match ring.shared.monitor.try_acquire() {
        Some(state) => s.field(
            "stats",
            &crate::MPMC::Structs::RingStats {
                in_flight: ring.shared.in_flight.load(Ordering::Acquire),
                ..state.stats()
            },
        ),
        None => s.field("stats", &format_args!("<locked>")),
    };
    s.finish()
}

/// Debug function for Slot
///
/// Shows the framing header only; payload bytes are summarized by length
pub fn debug_slot(slot: &Slot, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Slot")
        .field("header", &slot.header)
        .field("payload", &format_args!("<{} bytes>", slot.payload().len()))
        .finish()
}

pub fn debug_producer(producer: &Producer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Producer")
        .field("ring", producer.ring())
        .field("messages_sent", &producer.messages_sent())
        .field("bytes_sent", &producer.bytes_sent())
        .finish()
}

pub fn debug_consumer(consumer: &Consumer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Consumer")
        .field("ring", consumer.ring())
        .field("messages_received", &consumer.messages_received())
        .field("bytes_received", &consumer.bytes_received())
        .finish()
}

pub fn debug_message_stream(stream: &MessageStream, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MessageStream")
        .field("buffered", &stream.buffered())
        .field("running", &stream.is_running())
        .finish_non_exhaustive()
}
