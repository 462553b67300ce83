// Timing-sensitive tests run serially so a loaded test runner does not skew them.
use dmxp_fragring::{ReadPolicy, RingBuffer, RingError, FRAGMENT_CAPACITY};
use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};

fn bounded_ring(attempts: u32, min: Duration, max: Duration) -> RingBuffer {
    RingBuffer::builder()
        .with_capacity(4)
        .with_read_policy(ReadPolicy::BoundedRetry { attempts })
        .with_backoff(min, max)
        .build()
        .unwrap()
}

#[test]
#[serial]
fn bounded_read_gives_up_after_budget() {
    // 5 empty polls sleep 4 times: 1ms + 2ms + 2ms + 2ms.
    let ring = bounded_ring(5, Duration::from_millis(1), Duration::from_millis(2));

    let start = Instant::now();
    let err = ring.read().unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(err, RingError::NoDataAvailable);
    assert!(err.is_recoverable());
    assert!(elapsed >= Duration::from_millis(7), "gave up early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "gave up late: {elapsed:?}");
}

#[test]
#[serial]
fn bounded_read_default_budget_terminates() {
    let ring = RingBuffer::builder()
        .with_capacity(2)
        .with_read_policy(ReadPolicy::bounded())
        .build()
        .unwrap();
    assert_eq!(ring.read().unwrap_err(), RingError::NoDataAvailable);
    // The ring is still usable afterwards.
    ring.write_full(b"late").unwrap();
    assert_eq!(ring.read().unwrap(), b"late");
}

#[test]
#[serial]
fn bounded_read_succeeds_when_data_arrives_within_budget() {
    let ring = bounded_ring(200, Duration::from_millis(1), Duration::from_millis(5));
    let writer = {
        let ring = ring.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            ring.write_full(b"within budget").unwrap();
        })
    };
    assert_eq!(ring.read().unwrap(), b"within budget");
    writer.join().unwrap();
}

#[test]
fn try_read_on_empty_ring_fails_immediately() {
    let ring = RingBuffer::new(2).unwrap();
    assert_eq!(ring.try_read().unwrap_err(), RingError::NoDataAvailable);
    ring.write_full(b"now").unwrap();
    assert_eq!(ring.try_read().unwrap(), b"now");
}

#[test]
#[serial]
fn read_timeout_respects_deadline() {
    let ring = RingBuffer::new(2).unwrap();
    let start = Instant::now();
    assert_eq!(
        ring.read_timeout(Duration::from_millis(30)).unwrap_err(),
        RingError::NoDataAvailable
    );
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(30), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
#[serial]
fn blocking_read_wakes_on_signal() {
    let ring = RingBuffer::builder()
        .with_capacity(2)
        .with_read_policy(ReadPolicy::Block)
        .build()
        .unwrap();
    let reader = {
        let ring = ring.clone();
        thread::spawn(move || {
            let start = Instant::now();
            let message = ring.read().unwrap();
            (message, start.elapsed())
        })
    };

    thread::sleep(Duration::from_millis(50));
    ring.write_full(b"wake up").unwrap();

    let (message, waited) = reader.join().unwrap();
    assert_eq!(message, b"wake up");
    assert!(waited >= Duration::from_millis(40), "did not block: {waited:?}");
}

#[test]
#[serial]
fn backoff_read_picks_up_late_data() {
    let ring = RingBuffer::builder()
        .with_capacity(2)
        .with_read_policy(ReadPolicy::Backoff)
        .build()
        .unwrap();
    let writer = {
        let ring = ring.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            ring.write_full(b"eventually").unwrap();
        })
    };
    assert_eq!(ring.read().unwrap(), b"eventually");
    writer.join().unwrap();
}

#[test]
#[serial]
fn started_message_is_finished_despite_budget() {
    // Budget of 2 polls, but the second half of the message arrives much later.
    let ring = RingBuffer::builder()
        .with_capacity(1)
        .with_read_policy(ReadPolicy::BoundedRetry { attempts: 2 })
        .with_backoff(Duration::from_millis(1), Duration::from_millis(1))
        .build()
        .unwrap();
    let message = vec![7u8; 2 * FRAGMENT_CAPACITY];
    assert_eq!(ring.write(&message).unwrap(), FRAGMENT_CAPACITY);

    let reader = {
        let ring = ring.clone();
        thread::spawn(move || ring.read())
    };
    thread::sleep(Duration::from_millis(50));
    ring.write_full(&message[FRAGMENT_CAPACITY..]).unwrap();

    assert!(reader.join().unwrap().unwrap() == message);
}

#[test]
#[serial]
fn wait_for_data_returns_once_committed() {
    let ring = RingBuffer::new(2).unwrap();
    assert!(!ring.wait_for_data_timeout(Duration::from_millis(10)).unwrap());

    let waiter = {
        let ring = ring.clone();
        thread::spawn(move || ring.wait_for_data())
    };
    thread::sleep(Duration::from_millis(20));
    ring.write_full(b"x").unwrap();
    waiter.join().unwrap().unwrap();

    // Waiting does not consume.
    assert!(ring.wait_for_data_timeout(Duration::from_millis(10)).unwrap());
    assert_eq!(ring.read().unwrap(), b"x");
}

#[test]
#[serial]
fn bounded_reads_give_up_while_another_reader_is_parked() {
    let ring = RingBuffer::builder()
        .with_capacity(2)
        .with_read_policy(ReadPolicy::Block)
        .with_backoff(Duration::from_millis(1), Duration::from_millis(2))
        .build()
        .unwrap();
    let parked = {
        let ring = ring.clone();
        thread::spawn(move || ring.read())
    };
    while ring.stats().in_flight < 1 {
        thread::sleep(Duration::from_millis(1));
    }

    let start = Instant::now();
    assert_eq!(ring.try_read().unwrap_err(), RingError::NoDataAvailable);
    assert!(start.elapsed() < Duration::from_millis(500));

    let start = Instant::now();
    assert_eq!(
        ring.read_timeout(Duration::from_millis(30)).unwrap_err(),
        RingError::NoDataAvailable
    );
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(30), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "returned late: {elapsed:?}");

    let start = Instant::now();
    assert_eq!(
        ring.read_with(ReadPolicy::BoundedRetry { attempts: 5 })
            .unwrap_err(),
        RingError::NoDataAvailable
    );
    assert!(start.elapsed() < Duration::from_secs(2));

    ring.write_full(b"for the parked reader").unwrap();
    assert_eq!(parked.join().unwrap().unwrap(), b"for the parked reader");
}
