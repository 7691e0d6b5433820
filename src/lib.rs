//! A fixed-capacity, thread-safe blocking FIFO queue.
//!
//! `BoundedQueue<T, N>` stores at most `N` values in a ring buffer. Producers
//! that find it full can fail immediately, wait up to a deadline, or wait
//! forever; consumers get the same choice when it is empty. Values come out
//! in the order they went in.
//!
//! The crate also ships [`Producer`] and [`Consumer`] drivers that push and
//! pull a counted sequence of values with randomized think-times, used to
//! exercise a queue under timing jitter.

use std::fmt;
use std::time::Instant;

mod config;
pub use config::RoleConfig;

mod error;
pub use error::{PutError, QueueError, QueueResult};

mod timeout;
pub use timeout::Timeout;

mod role;
pub use role::{RoleState, ThinkTime};

mod producer;
pub use producer::Producer;

mod consumer;
pub use consumer::Consumer;

mod ring;
mod sync;

use ring::Ring;
use sync::{Condvar, Mutex, MutexGuard};

#[cfg(feature = "async")]
use std::pin::pin;
#[cfg(feature = "async")]
use tokio::sync::Notify;

/// A bounded blocking queue holding at most `N` values.
///
/// Share it between threads behind an `Arc`. Every operation takes `&self`.
pub struct BoundedQueue<T, const N: usize> {
    ring: Mutex<Ring<T, N>>,
    space_available: Condvar, // Signaled after a get frees a slot
    data_available: Condvar,  // Signaled after a put fills a slot
    #[cfg(feature = "async")]
    space_notify: Notify,
    #[cfg(feature = "async")]
    data_notify: Notify,
}

impl<T, const N: usize> BoundedQueue<T, N> {
    /// Creates an empty queue.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidConfiguration` when `N` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use boundq::BoundedQueue;
    ///
    /// let queue = BoundedQueue::<u32, 10>::new().expect("non-zero capacity");
    /// assert_eq!(queue.capacity(), 10);
    /// assert!(BoundedQueue::<u32, 0>::new().is_err());
    /// ```
    pub fn new() -> QueueResult<Self> {
        if N == 0 {
            return Err(QueueError::InvalidConfiguration(
                "capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            ring: Mutex::new(Ring::new()),
            space_available: Condvar::new(),
            data_available: Condvar::new(),
            #[cfg(feature = "async")]
            space_notify: Notify::new(),
            #[cfg(feature = "async")]
            data_notify: Notify::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of values currently stored. Stale as soon as it returns if
    /// other threads are active.
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring.lock().is_full()
    }

    /// Stores `value` if a slot is free, without waiting.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boundq::{BoundedQueue, QueueError};
    /// let queue = BoundedQueue::<u32, 1>::new().unwrap();
    /// assert!(queue.try_put(1).is_ok());
    /// let rejected = queue.try_put(2).unwrap_err();
    /// assert_eq!(rejected.reason(), &QueueError::Full);
    /// assert_eq!(rejected.into_inner(), 2);
    /// ```
    pub fn try_put(&self, value: T) -> Result<(), PutError<T>> {
        let pushed = self.ring.lock().push(value);
        match pushed {
            Ok(()) => {
                self.signal_data();
                Ok(())
            }
            Err(value) => Err(PutError::new(value, QueueError::Full)),
        }
    }

    /// Stores `value`, waiting up to `timeout` for a slot to free up.
    ///
    /// A zero timeout behaves exactly like [`try_put`](Self::try_put).
    /// `Timeout::Forever` waits until a consumer makes room.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boundq::{BoundedQueue, QueueError, Timeout};
    /// # use std::time::Duration;
    /// let queue = BoundedQueue::<u32, 1>::new().unwrap();
    /// queue.try_put_for(1, Duration::from_millis(5)).unwrap();
    /// let err = queue.try_put_for(2, Duration::from_millis(5)).unwrap_err();
    /// assert!(matches!(err.reason(), QueueError::Timeout(_)));
    /// ```
    pub fn try_put_for(&self, value: T, timeout: impl Into<Timeout>) -> Result<(), PutError<T>> {
        let timeout = timeout.into();
        if timeout.is_zero() {
            return self.try_put(value);
        }
        let deadline = timeout.deadline_from(Instant::now());

        let mut value = value;
        let mut ring = self.ring.lock();
        loop {
            match ring.push(value) {
                Ok(()) => break,
                Err(rejected) => value = rejected,
            }
            tracing::trace!(capacity = N, "queue full, waiting for space");
            if !Self::park(&self.space_available, &mut ring, deadline) && ring.is_full() {
                tracing::debug!(?timeout, "put timed out on a full queue");
                return Err(PutError::new(
                    value,
                    QueueError::Timeout(timeout.duration()),
                ));
            }
        }
        drop(ring);
        self.signal_data();
        Ok(())
    }

    /// Stores `value`, waiting as long as it takes.
    pub fn put(&self, value: T) {
        let mut value = value;
        let mut ring = self.ring.lock();
        loop {
            match ring.push(value) {
                Ok(()) => break,
                Err(rejected) => value = rejected,
            }
            tracing::trace!(capacity = N, "queue full, waiting for space");
            self.space_available.wait(&mut ring);
        }
        drop(ring);
        self.signal_data();
    }

    /// Takes the oldest value if there is one, without waiting.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boundq::{BoundedQueue, QueueError};
    /// let queue = BoundedQueue::<&str, 2>::new().unwrap();
    /// assert_eq!(queue.try_get(), Err(QueueError::Empty));
    /// queue.try_put("a").unwrap();
    /// queue.try_put("b").unwrap();
    /// assert_eq!(queue.try_get(), Ok("a"));
    /// ```
    pub fn try_get(&self) -> QueueResult<T> {
        let popped = self.ring.lock().pop();
        match popped {
            Some(value) => {
                self.signal_space();
                Ok(value)
            }
            None => Err(QueueError::Empty),
        }
    }

    /// Takes the oldest value, waiting up to `timeout` for one to arrive.
    ///
    /// Same timeout rules as [`try_put_for`](Self::try_put_for).
    pub fn try_get_for(&self, timeout: impl Into<Timeout>) -> QueueResult<T> {
        let timeout = timeout.into();
        if timeout.is_zero() {
            return self.try_get();
        }
        let deadline = timeout.deadline_from(Instant::now());

        let mut ring = self.ring.lock();
        let value = loop {
            if let Some(value) = ring.pop() {
                break value;
            }
            tracing::trace!(capacity = N, "queue empty, waiting for data");
            if !Self::park(&self.data_available, &mut ring, deadline) && ring.is_empty() {
                tracing::debug!(?timeout, "get timed out on an empty queue");
                return Err(QueueError::Timeout(timeout.duration()));
            }
        };
        drop(ring);
        self.signal_space();
        Ok(value)
    }

    /// Takes the oldest value, waiting as long as it takes.
    pub fn get(&self) -> T {
        let mut ring = self.ring.lock();
        let value = loop {
            if let Some(value) = ring.pop() {
                break value;
            }
            tracing::trace!(capacity = N, "queue empty, waiting for data");
            self.data_available.wait(&mut ring);
        };
        drop(ring);
        self.signal_space();
        value
    }

    /// Removes every stored value, oldest first, and wakes all blocked
    /// producers.
    pub fn drain(&self) -> Vec<T> {
        let items = self.ring.lock().drain();
        if !items.is_empty() {
            self.space_available.notify_all();
            #[cfg(feature = "async")]
            self.space_notify.notify_waiters();
        }
        items
    }

    /// Waits on `cond` until notified or until `deadline`. Returns `false`
    /// once the deadline has passed.
    fn park(cond: &Condvar, ring: &mut MutexGuard<'_, Ring<T, N>>, deadline: Option<Instant>) -> bool {
        match deadline {
            None => {
                cond.wait(ring);
                true
            }
            Some(deadline) => !cond.wait_until(ring, deadline).timed_out(),
        }
    }

    fn signal_data(&self) {
        self.data_available.notify_one();
        #[cfg(feature = "async")]
        self.data_notify.notify_one();
    }

    fn signal_space(&self) {
        self.space_available.notify_one();
        #[cfg(feature = "async")]
        self.space_notify.notify_one();
    }
}

// --- Asynchronous methods ---

#[cfg(feature = "async")]
impl<T, const N: usize> BoundedQueue<T, N> {
    /// Asynchronously stores `value`, waiting as long as it takes.
    pub async fn put_async(&self, value: T) {
        let mut value = value;
        loop {
            // Register interest before checking, so a get that lands between
            // the check and the await still wakes us.
            let mut notified = pin!(self.space_notify.notified());
            notified.as_mut().enable();
            match self.try_put(value) {
                Ok(()) => return,
                Err(rejected) => value = rejected.into_inner(),
            }
            notified.await;
        }
    }

    /// Asynchronously stores `value`, giving up after `timeout`.
    pub async fn put_async_timeout(
        &self,
        value: T,
        timeout: impl Into<Timeout>,
    ) -> Result<(), PutError<T>> {
        let timeout = timeout.into();
        if timeout.is_zero() {
            return self.try_put(value);
        }
        let deadline = timeout
            .deadline_from(Instant::now())
            .map(tokio::time::Instant::from_std);

        let mut value = value;
        loop {
            let mut notified = pin!(self.space_notify.notified());
            notified.as_mut().enable();
            match self.try_put(value) {
                Ok(()) => return Ok(()),
                Err(rejected) => value = rejected.into_inner(),
            }
            match deadline {
                None => notified.await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return self.try_put(value).map_err(|rejected| {
                            PutError::new(
                                rejected.into_inner(),
                                QueueError::Timeout(timeout.duration()),
                            )
                        });
                    }
                }
            }
        }
    }

    /// Asynchronously takes the oldest value, waiting as long as it takes.
    pub async fn get_async(&self) -> T {
        loop {
            let mut notified = pin!(self.data_notify.notified());
            notified.as_mut().enable();
            if let Ok(value) = self.try_get() {
                return value;
            }
            notified.await;
        }
    }

    /// Asynchronously takes the oldest value, giving up after `timeout`.
    pub async fn get_async_timeout(&self, timeout: impl Into<Timeout>) -> QueueResult<T> {
        let timeout = timeout.into();
        if timeout.is_zero() {
            return self.try_get();
        }
        let deadline = timeout
            .deadline_from(Instant::now())
            .map(tokio::time::Instant::from_std);

        loop {
            let mut notified = pin!(self.data_notify.notified());
            notified.as_mut().enable();
            if let Ok(value) = self.try_get() {
                return Ok(value);
            }
            match deadline {
                None => notified.await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return self
                            .try_get()
                            .map_err(|_| QueueError::Timeout(timeout.duration()));
                    }
                }
            }
        }
    }
}

impl<T, const N: usize> fmt::Debug for BoundedQueue<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &N)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_put_get() {
        let queue = BoundedQueue::<i32, 4>::new().unwrap();
        queue.try_put(1).unwrap();
        queue.try_put(2).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_get().unwrap(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_get().unwrap(), 2);
        assert_eq!(queue.len(), 0);
        assert!(matches!(queue.try_get(), Err(QueueError::Empty)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = BoundedQueue::<i32, 0>::new().unwrap_err();
        assert!(matches!(err, QueueError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_full_queue_never_overwrites() {
        let queue = BoundedQueue::<i32, 3>::new().unwrap();
        for i in 0..3 {
            queue.try_put(i).unwrap();
        }
        assert!(queue.is_full());
        let err = queue.try_put(42).unwrap_err();
        assert_eq!(err.reason(), &QueueError::Full);
        assert_eq!(err.into_inner(), 42);
        assert_eq!(queue.drain(), vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_timeout_is_non_blocking() {
        let queue = BoundedQueue::<i32, 1>::new().unwrap();
        assert_eq!(queue.try_get_for(Timeout::ZERO), Err(QueueError::Empty));
        queue.try_put_for(1, Timeout::ZERO).unwrap();
        let err = queue.try_put_for(2, Duration::ZERO).unwrap_err();
        assert_eq!(err.reason(), &QueueError::Full);
    }

    #[test]
    fn test_get_timeout_on_empty() {
        let queue = BoundedQueue::<i32, 2>::new().unwrap();
        let timeout = Duration::from_millis(20);
        let start = Instant::now();
        assert_eq!(queue.try_get_for(timeout), Err(QueueError::Timeout(timeout)));
        assert!(start.elapsed() >= timeout);
    }

    #[test]
    fn test_wraparound_many_cycles() {
        let queue = BoundedQueue::<u32, 3>::new().unwrap();
        let mut expected = 0;
        for i in 0..100u32 {
            queue.try_put(i).unwrap();
            if i % 2 == 1 {
                assert_eq!(queue.try_get().unwrap(), expected);
                assert_eq!(queue.try_get().unwrap(), expected + 1);
                expected += 2;
            }
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_blocking_put_wakes_on_get() {
        let queue = Arc::new(BoundedQueue::<u32, 1>::new().unwrap());
        queue.put(1);

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.try_put_for(2, Timeout::Forever).is_ok())
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.get(), 1);
        assert!(producer.join().unwrap());
        assert_eq!(queue.get(), 2);
    }

    #[test]
    fn test_blocking_get_wakes_on_put() {
        let queue = Arc::new(BoundedQueue::<u32, 1>::new().unwrap());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.try_get_for(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(20));
        queue.put(7);
        assert_eq!(consumer.join().unwrap(), Ok(7));
    }

    #[test]
    fn test_drain_wakes_blocked_producers() {
        let queue = Arc::new(BoundedQueue::<u32, 2>::new().unwrap());
        queue.put(0);
        queue.put(1);

        let producers: Vec<_> = (2..4)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.put(i))
            })
            .collect();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.drain(), vec![0, 1]);
        for producer in producers {
            producer.join().unwrap();
        }
        let mut rest = queue.drain();
        rest.sort_unstable();
        assert_eq!(rest, vec![2, 3]);
    }

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_drop_releases_stored_values() {
        let drops = Arc::new(AtomicUsize::new(0));
        {
            let queue = BoundedQueue::<DropCounter, 4>::new().unwrap();
            for _ in 0..3 {
                queue.put(DropCounter(Arc::clone(&drops)));
            }
            drop(queue.get());
            assert_eq!(drops.load(Ordering::SeqCst), 1);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_construct_and_drop_without_use() {
        let drops = Arc::new(AtomicUsize::new(0));
        let queue = BoundedQueue::<DropCounter, 8>::new().unwrap();
        assert!(queue.is_empty());
        drop(queue);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_debug_output() {
        let queue = BoundedQueue::<u8, 5>::new().unwrap();
        queue.put(1);
        assert_eq!(format!("{:?}", queue), "BoundedQueue { capacity: 5, len: 1 }");
    }

    #[cfg(feature = "async")]
    mod async_tests {
        use super::*;

        #[tokio::test]
        async fn test_put_get_async() {
            let queue = BoundedQueue::<i32, 2>::new().unwrap();
            queue.put_async(1).await;
            queue.put_async(2).await;
            assert_eq!(queue.get_async().await, 1);
            assert_eq!(queue.get_async().await, 2);
        }

        #[tokio::test]
        async fn test_get_async_timeout_on_empty() {
            let queue = BoundedQueue::<i32, 2>::new().unwrap();
            let result = queue.get_async_timeout(Duration::from_millis(10)).await;
            assert_eq!(result, Err(QueueError::Timeout(Duration::from_millis(10))));
        }

        #[tokio::test]
        async fn test_put_async_timeout_returns_value() {
            let queue = BoundedQueue::<i32, 1>::new().unwrap();
            queue.put_async_timeout(1, Duration::from_millis(10)).await.unwrap();
            let err = queue
                .put_async_timeout(2, Duration::from_millis(10))
                .await
                .unwrap_err();
            assert!(matches!(err.reason(), QueueError::Timeout(_)));
            assert_eq!(err.into_inner(), 2);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_async_put_woken_by_blocking_get() {
            let queue = Arc::new(BoundedQueue::<u32, 1>::new().unwrap());
            queue.put(1);

            let getter = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(20));
                    queue.get()
                })
            };
            queue.put_async_timeout(2, Timeout::Forever).await.unwrap();
            assert_eq!(getter.join().unwrap(), 1);
            assert_eq!(queue.get_async().await, 2);
        }
    }
}
