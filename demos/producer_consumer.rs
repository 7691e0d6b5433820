//! Runs one producer and one consumer over a queue of 10 slots, three times:
//! equal paces, a fast producer that hits backpressure, and a fast consumer
//! that keeps finding the queue empty.
//!
//! `RUST_LOG=boundq=debug cargo run --example producer_consumer` shows every
//! value as it moves through the queue.

use boundq::{BoundedQueue, Consumer, Producer, QueueResult, RoleConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const ITEMS: u64 = 30;
const CAPACITY: usize = 10;

fn run_round(produce_wait: Duration, consume_wait: Duration) -> QueueResult<Duration> {
    let queue = Arc::new(BoundedQueue::<u64, CAPACITY>::new()?);
    let base = RoleConfig::default().with_item_count(ITEMS);
    let mut producer = Producer::new(Arc::clone(&queue), &base.clone().with_base_wait(produce_wait))?;
    let mut consumer = Consumer::new(Arc::clone(&queue), &base.with_base_wait(consume_wait))?;

    let start = Instant::now();
    producer.start()?;
    consumer.start()?;
    producer.wait()?;
    let consumed = consumer.wait()?;
    tracing::info!(values = consumed.len(), "round finished in order");
    Ok(start.elapsed())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rounds = [
        (Duration::from_millis(5), Duration::from_millis(5)),
        (Duration::from_micros(500), Duration::from_millis(5)),
        (Duration::from_millis(5), Duration::from_micros(500)),
    ];

    let mut failed = false;
    for (round, (produce_wait, consume_wait)) in rounds.into_iter().enumerate() {
        match run_round(produce_wait, consume_wait) {
            Ok(elapsed) => println!(
                "round {}: produce {:?} / consume {:?} -> {} values in {:?}",
                round + 1,
                produce_wait,
                consume_wait,
                ITEMS,
                elapsed
            ),
            Err(err) => {
                eprintln!("round {} failed: {}", round + 1, err);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
