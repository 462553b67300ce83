// In demos/stream.rs
//
// A producer thread sends numbered, hashed messages until Ctrl+C; the main
// thread receives them through a MessageStream and verifies every hash.
//
//   cargo run --example stream
use dmxp_fragring::{MessageStream, RingBuffer, RingError};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn payload(i: u64) -> Vec<u8> {
    // Every 100th message spans several fragments.
    let len = if i % 100 == 0 { 200_000 } else { 64 };
    let body = format!("message_{i}").into_bytes();
    let mut message: Vec<u8> = body.iter().copied().cycle().take(len).collect();
    let digest = Sha256::digest(&message);
    message.extend_from_slice(&digest);
    message
}

fn verify(message: &[u8]) -> bool {
    let (body, digest) = message.split_at(message.len() - 32);
    Sha256::digest(body).as_slice() == digest
}

fn main() -> Result<(), RingError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ring = RingBuffer::new(8)?;
    let keep_alive = Arc::new(AtomicBool::new(true));
    let keep_alive_for_handler = Arc::clone(&keep_alive);

    ctrlc::set_handler(move || {
        keep_alive_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let producer = {
        let producer = ring.producer();
        let keep_alive = Arc::clone(&keep_alive);
        thread::spawn(move || -> Result<u64, RingError> {
            let mut i = 0;
            while keep_alive.load(Ordering::SeqCst) {
                producer.send(payload(i))?;
                i += 1;
            }
            Ok(producer.messages_sent())
        })
    };

    let stream = MessageStream::spawn(ring.clone(), 32, Duration::from_millis(20))
        .expect("Failed to spawn stream reader");
    println!("Stream: receiving, press Ctrl+C to stop");

    let mut received = 0u64;
    let mut corrupt = 0u64;
    let mut tally = |message: Vec<u8>| {
        received += 1;
        if !verify(&message) {
            corrupt += 1;
        }
        if received % 10_000 == 0 {
            info!(received, "progress");
        }
    };

    while keep_alive.load(Ordering::SeqCst) {
        if let Ok(message) = stream.recv_timeout(Duration::from_millis(100)) {
            tally(message);
        }
    }

    let sent = producer.join().expect("producer panicked")?;
    // Drain what the producer committed before it saw the flag.
    while let Ok(message) = stream.recv_timeout(Duration::from_millis(200)) {
        tally(message);
    }
    stream.stop()?;

    println!("Stream: sent {sent}, received {received}, corrupt {corrupt}");
    ring.destroy()?;
    Ok(())
}
