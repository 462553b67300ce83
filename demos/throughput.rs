// In demos/throughput.rs
//
// Streams one large message through a small ring and checks it arrives intact.
//
//   cargo run --release --example throughput -- 256 16
//   RUST_LOG=dmxp_fragring=trace cargo run --example throughput -- 4
use dmxp_fragring::{RingBuffer, FRAGMENT_CAPACITY};
use sha2::{Digest, Sha256};
use std::env;
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <megabytes> [slots]", args[0]);
        std::process::exit(1);
    }

    let megabytes: usize = args[1].parse().expect("Invalid message size");
    let slots: usize = args
        .get(2)
        .map(|s| s.parse().expect("Invalid slot count"))
        .unwrap_or(16);

    let len = megabytes * 1024 * 1024;
    let message: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    let expected = format!("{:x}", Sha256::digest(&message));

    let ring = RingBuffer::new(slots).expect("Failed to create ring");
    println!(
        "Throughput: {} MiB through {} slots of {} KiB ({} fragments)",
        megabytes,
        slots,
        FRAGMENT_CAPACITY / 1024,
        dmxp_fragring::fragment_count(len)
    );

    let consumer = {
        let ring = ring.clone();
        thread::spawn(move || ring.read().expect("read failed"))
    };

    let start = Instant::now();
    ring.write_full(&message).expect("write_full failed");
    let received = consumer.join().expect("consumer panicked");
    let elapsed = start.elapsed();

    let actual = format!("{:x}", Sha256::digest(&received));
    println!("Throughput: sha256 sent     {expected}");
    println!("Throughput: sha256 received {actual}");
    println!(
        "Throughput: {:.2} GB/s ({:.2?})",
        len as f64 / elapsed.as_secs_f64() / 1e9,
        elapsed
    );

    ring.destroy().expect("destroy failed");
    if actual != expected {
        eprintln!("Throughput: digest mismatch");
        std::process::exit(1);
    }
}
