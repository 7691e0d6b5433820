use crate::role::Worker;
use crate::{BoundedQueue, QueueResult, RoleConfig, RoleState, ThinkTime};
use std::sync::Arc;

/// Pushes `0, 1, 2, ...` into a shared queue from its own thread, pausing a
/// random think-time before each value.
///
/// # Examples
///
/// ```
/// use boundq::{BoundedQueue, Producer, RoleConfig};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let queue = Arc::new(BoundedQueue::<u64, 4>::new().unwrap());
/// let config = RoleConfig::default()
///     .with_item_count(3)
///     .with_base_wait(Duration::ZERO);
/// let mut producer = Producer::new(Arc::clone(&queue), &config).unwrap();
/// producer.start().unwrap();
/// assert_eq!(producer.wait().unwrap(), 3);
/// assert_eq!(queue.drain(), vec![0, 1, 2]);
/// ```
pub struct Producer<const N: usize> {
    queue: Arc<BoundedQueue<u64, N>>,
    item_count: u64,
    think_time: Option<ThinkTime>, // Moved onto the thread by `start`
    worker: Worker<u64>,
}

impl<const N: usize> Producer<N> {
    pub fn new(queue: Arc<BoundedQueue<u64, N>>, config: &RoleConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self {
            queue,
            item_count: config.item_count,
            think_time: Some(ThinkTime::from_config(config)),
            worker: Worker::new("producer"),
        })
    }

    pub fn start(&mut self) -> QueueResult<()> {
        let think_time = self
            .think_time
            .take()
            .ok_or_else(|| self.worker.already_started())?;
        let queue = Arc::clone(&self.queue);
        let item_count = self.item_count;
        self.worker
            .spawn(move || produce(&queue, think_time, item_count))
    }

    /// Blocks until the producer has put every value. Returns how many it put.
    pub fn wait(&mut self) -> QueueResult<u64> {
        self.worker.join()
    }

    pub fn state(&self) -> RoleState {
        self.worker.state()
    }
}

fn produce<const N: usize>(queue: &BoundedQueue<u64, N>, mut think_time: ThinkTime, item_count: u64) -> u64 {
    tracing::info!(item_count, seed = think_time.seed(), "producer started");
    let mut value = 0;
    while value < item_count {
        think_time.pause();
        queue.put(value);
        tracing::debug!(value, "produced");
        value += 1;
    }
    tracing::info!(produced = value, "producer done");
    value
}
