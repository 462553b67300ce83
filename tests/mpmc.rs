use dmxp_fragring::{ReadPolicy, RingBuffer, FRAGMENT_CAPACITY};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Message `seq` from producer `producer`: an 8-byte tag followed by filler
/// derived from the tag, so any mixing of two messages is detectable.
fn tagged_message(producer: u32, seq: u32, len: usize) -> Vec<u8> {
    let mut message = Vec::with_capacity(len.max(8));
    message.extend_from_slice(&producer.to_le_bytes());
    message.extend_from_slice(&seq.to_le_bytes());
    let seed = producer.wrapping_mul(31).wrapping_add(seq) as u8;
    message.extend((8..len.max(8)).map(|i| seed.wrapping_add(i as u8)));
    message
}

fn parse_tag(message: &[u8]) -> (u32, u32) {
    let producer = u32::from_le_bytes(message[0..4].try_into().unwrap());
    let seq = u32::from_le_bytes(message[4..8].try_into().unwrap());
    (producer, seq)
}

/// Fails the test instead of hanging if the ring ever deadlocks.
fn deadlock_watchdog() -> Arc<AtomicBool> {
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    thread::spawn(move || {
        while !flag.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(200));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("{} deadlock(s) detected", deadlocks.len());
                std::process::abort();
            }
        }
    });
    done
}

#[test]
fn single_producer_single_consumer_keeps_order() {
    let watchdog = deadlock_watchdog();
    let ring = RingBuffer::builder()
        .with_capacity(8)
        .with_read_policy(ReadPolicy::Block)
        .build()
        .unwrap();
    let count = 200;

    let producer = ring.producer();
    let p = thread::spawn(move || {
        for seq in 0..count {
            let len = 8 + (seq as usize * 4099) % (3 * FRAGMENT_CAPACITY);
            producer.send(tagged_message(0, seq, len)).unwrap();
        }
        producer.messages_sent()
    });

    let consumer = ring.consumer();
    let c = thread::spawn(move || {
        for seq in 0..count {
            let len = 8 + (seq as usize * 4099) % (3 * FRAGMENT_CAPACITY);
            let message = consumer.receive().unwrap();
            assert_eq!(parse_tag(&message), (0, seq));
            assert!(message == tagged_message(0, seq, len), "message {seq} corrupted");
        }
        consumer.messages_received()
    });

    assert_eq!(p.join().unwrap(), count as u64);
    assert_eq!(c.join().unwrap(), count as u64);
    assert!(ring.is_empty());
    watchdog.store(true, Ordering::Relaxed);
}

#[test]
fn concurrent_writers_never_interleave_fragments() {
    let watchdog = deadlock_watchdog();
    let ring = RingBuffer::builder()
        .with_capacity(4)
        .with_read_policy(ReadPolicy::Block)
        .build()
        .unwrap();
    let producers = 4u32;
    let per_producer = 25u32;
    let len = 2 * FRAGMENT_CAPACITY + 321;

    let mut handles = Vec::new();
    for p_id in 0..producers {
        let ring = ring.clone();
        handles.push(thread::spawn(move || {
            for seq in 0..per_producer {
                ring.write_full(&tagged_message(p_id, seq, len)).unwrap();
            }
        }));
    }

    let mut next_seq: HashMap<u32, u32> = HashMap::new();
    for _ in 0..producers * per_producer {
        let message = ring.read().unwrap();
        let (p_id, seq) = parse_tag(&message);
        assert!(message == tagged_message(p_id, seq, len), "mixed message from {p_id}");

        // Per-producer order survives even though producers interleave.
        let expected = next_seq.entry(p_id).or_insert(0);
        assert_eq!(seq, *expected);
        *expected += 1;
    }

    for h in handles {
        h.join().unwrap();
    }
    assert!(next_seq.values().all(|&n| n == per_producer));
    watchdog.store(true, Ordering::Relaxed);
}

#[test]
fn many_producers_many_consumers_deliver_everything_once() {
    let watchdog = deadlock_watchdog();
    let ring = RingBuffer::builder()
        .with_capacity(16)
        .with_read_policy(ReadPolicy::Backoff)
        .build()
        .unwrap();
    let producers = 3u32;
    let consumers = 3;
    let per_producer = 300u32;
    let total = (producers * per_producer) as u64;

    let mut handles = Vec::new();
    for p_id in 0..producers {
        let producer = ring.producer();
        handles.push(thread::spawn(move || {
            for seq in 0..per_producer {
                let len = 8 + (seq as usize * 7919) % (FRAGMENT_CAPACITY + 1000);
                producer.send(tagged_message(p_id, seq, len)).unwrap();
            }
        }));
    }

    let received = Arc::new(AtomicU64::new(0));
    let checksum = Arc::new(AtomicU64::new(0));
    let mut readers = Vec::new();
    for _ in 0..consumers {
        let ring = ring.clone();
        let received = Arc::clone(&received);
        let checksum = Arc::clone(&checksum);
        readers.push(thread::spawn(move || loop {
            if received.load(Ordering::SeqCst) >= total {
                break;
            }
            match ring.read_timeout(Duration::from_millis(50)) {
                Ok(message) => {
                    let (p_id, seq) = parse_tag(&message);
                    let len = 8 + (seq as usize * 7919) % (FRAGMENT_CAPACITY + 1000);
                    assert!(message == tagged_message(p_id, seq, len));
                    checksum.fetch_add((p_id * per_producer + seq) as u64, Ordering::SeqCst);
                    received.fetch_add(1, Ordering::SeqCst);
                }
                Err(err) => assert!(err.is_recoverable(), "unexpected error: {err}"),
            }
        }));
    }

    for h in handles.into_iter().chain(readers) {
        h.join().unwrap();
    }

    assert_eq!(received.load(Ordering::SeqCst), total);
    assert_eq!(checksum.load(Ordering::SeqCst), (0..total).sum::<u64>());
    watchdog.store(true, Ordering::Relaxed);
}

#[test]
fn randomized_sizes_round_trip_in_order() {
    let ring = RingBuffer::builder()
        .with_capacity(5)
        .with_read_policy(ReadPolicy::Block)
        .build()
        .unwrap();
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let sizes: Vec<usize> = (0..64)
        .map(|_| rng.usize(0..4 * FRAGMENT_CAPACITY))
        .collect();

    let writer = {
        let ring = ring.clone();
        let sizes = sizes.clone();
        thread::spawn(move || {
            let mut rng = fastrand::Rng::with_seed(0xda7a);
            for len in sizes {
                let mut message = vec![0u8; len];
                rng.fill(&mut message);
                ring.write_full(&message).unwrap();
            }
        })
    };

    let mut rng = fastrand::Rng::with_seed(0xda7a);
    for &len in &sizes {
        let mut expected = vec![0u8; len];
        rng.fill(&mut expected);
        let message = ring.read().unwrap();
        assert_eq!(message.len(), len);
        assert!(message == expected);
    }
    writer.join().unwrap();
}

#[test]
fn open_partial_write_holds_off_other_writers() {
    let watchdog = deadlock_watchdog();
    let ring = RingBuffer::builder()
        .with_capacity(1)
        .with_read_policy(ReadPolicy::Block)
        .build()
        .unwrap();
    let first = vec![0xAAu8; 2 * FRAGMENT_CAPACITY];
    assert_eq!(ring.write(&first).unwrap(), FRAGMENT_CAPACITY);

    let other = ring.clone();
    assert_eq!(other.write(b"not yet").unwrap(), 0);
    let second_writer = thread::spawn(move || other.write_full(b"hello from another writer"));

    let reader = {
        let ring = ring.clone();
        thread::spawn(move || (ring.read().unwrap(), ring.read().unwrap()))
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!second_writer.is_finished(), "wrote into a foreign open message");
    assert_eq!(
        ring.stats().open_message_remaining,
        Some(FRAGMENT_CAPACITY as u64)
    );

    ring.write_full(&first[FRAGMENT_CAPACITY..]).unwrap();
    second_writer.join().unwrap().unwrap();

    let (a, b) = reader.join().unwrap();
    assert!(a == first);
    assert_eq!(b, b"hello from another writer");
    assert_eq!(ring.stats().open_message_remaining, None);
    watchdog.store(true, Ordering::Relaxed);
}
