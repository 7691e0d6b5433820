use crate::role::Worker;
use crate::{BoundedQueue, QueueError, QueueResult, RoleConfig, RoleState, ThinkTime};
use std::sync::Arc;

/// Pulls a fixed number of values from a shared queue on its own thread,
/// pausing a random think-time after each one, and checks that the i-th
/// value it sees is `i`.
pub struct Consumer<const N: usize> {
    queue: Arc<BoundedQueue<u64, N>>,
    item_count: u64,
    think_time: Option<ThinkTime>,
    worker: Worker<QueueResult<Vec<u64>>>,
}

impl<const N: usize> Consumer<N> {
    pub fn new(queue: Arc<BoundedQueue<u64, N>>, config: &RoleConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self {
            queue,
            item_count: config.item_count,
            think_time: Some(ThinkTime::from_config(config)),
            worker: Worker::new("consumer"),
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
            .spawn(move || consume(&queue, think_time, item_count))
    }

    /// Blocks until every value has been consumed and returns them in the
    /// order they were taken.
    ///
    /// # Errors
    ///
    /// `QueueError::OutOfOrder` for the first value that did not match its
    /// position, plus the lifecycle errors of the role thread.
    pub fn wait(&mut self) -> QueueResult<Vec<u64>> {
        self.worker.join()?
    }

    pub fn state(&self) -> RoleState {
        self.worker.state()
    }
}

fn consume<const N: usize>(
    queue: &BoundedQueue<u64, N>,
    mut think_time: ThinkTime,
    item_count: u64,
) -> QueueResult<Vec<u64>> {
    tracing::info!(item_count, seed = think_time.seed(), "consumer started");
    let mut values = Vec::new();
    let mut violation = None;
    for index in 0..item_count {
        let value = queue.get();
        think_time.pause();
        if value != index && violation.is_none() {
            tracing::warn!(index, value, "value consumed out of order");
            violation = Some(QueueError::OutOfOrder { index, value });
        }
        tracing::debug!(index, value, "consumed");
        values.push(value);
    }
    tracing::info!(consumed = values.len(), "consumer done");
    match violation {
        Some(err) => Err(err),
        None => Ok(values),
    }
}
