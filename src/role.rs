//! Pieces shared by the producer and consumer drivers: the lifecycle state,
//! the jittered think-time source and the thread wrapper.

use crate::{QueueError, QueueResult, RoleConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleState {
    /// Constructed, not started.
    Idle,
    /// Thread spawned and still working through its items.
    Running,
    /// All items handled.
    Done,
}

/// Source of randomized pauses, uniform over `[base, 2 * base)` microseconds.
///
/// Each role owns one, seeded independently, so runs can be replayed from
/// the logged seed.
pub struct ThinkTime {
    base_micros: u64,
    seed: u64,
    rng: StdRng,
}

impl ThinkTime {
    pub fn new(base_wait: Duration, seed: u64) -> Self {
        let base_micros = u64::try_from(base_wait.as_micros())
            .unwrap_or(u64::MAX)
            .min(u64::MAX / 2);
        Self {
            base_micros,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &RoleConfig) -> Self {
        Self::new(config.base_wait, config.seed.unwrap_or_else(rand::random))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_wait(&mut self) -> Duration {
        if self.base_micros == 0 {
            return Duration::ZERO;
        }
        let jitter = self.rng.gen_range(0..self.base_micros);
        Duration::from_micros(self.base_micros + jitter)
    }

    /// Sleeps the calling thread for the next think-time.
    pub(crate) fn pause(&mut self) {
        let wait = self.next_wait();
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}

/// Owns the thread a role runs on.
pub(crate) struct Worker<R> {
    name: &'static str,
    handle: Option<JoinHandle<R>>,
    joined: bool,
}

impl<R: Send + 'static> Worker<R> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: None,
            joined: false,
        }
    }

    pub(crate) fn state(&self) -> RoleState {
        match &self.handle {
            Some(handle) if handle.is_finished() => RoleState::Done,
            Some(_) => RoleState::Running,
            None if self.joined => RoleState::Done,
            None => RoleState::Idle,
        }
    }

    pub(crate) fn already_started(&self) -> QueueError {
        QueueError::InvalidOperation(format!("{} already started", self.name))
    }

    pub(crate) fn spawn<F>(&mut self, body: F) -> QueueResult<()>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        if self.state() != RoleState::Idle {
            return Err(self.already_started());
        }
        let handle = thread::Builder::new()
            .name(self.name.to_string())
            .spawn(body)
            .map_err(|e| QueueError::SpawnFailed(format!("{}: {}", self.name, e)))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Blocks until the role thread returns.
    pub(crate) fn join(&mut self) -> QueueResult<R> {
        let handle = self.handle.take().ok_or_else(|| {
            let reason = if self.joined {
                "already joined"
            } else {
                "was never started"
            };
            QueueError::InvalidOperation(format!("{} {}", self.name, reason))
        })?;
        self.joined = true;
        handle
            .join()
            .map_err(|_| QueueError::RolePanicked(self.name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_think_time_bounds() {
        let base = Duration::from_micros(100);
        let mut think_time = ThinkTime::new(base, 42);
        for _ in 0..1000 {
            let wait = think_time.next_wait();
            assert!(wait >= base, "wait {:?} below base", wait);
            assert!(wait < base * 2, "wait {:?} not below twice the base", wait);
        }
    }

    #[test]
    fn test_think_time_is_reproducible() {
        let base = Duration::from_millis(1);
        let mut a = ThinkTime::new(base, 0xC0FFEE);
        let mut b = ThinkTime::new(base, 0xC0FFEE);
        let waits_a: Vec<_> = (0..32).map(|_| a.next_wait()).collect();
        let waits_b: Vec<_> = (0..32).map(|_| b.next_wait()).collect();
        assert_eq!(waits_a, waits_b);
        assert_eq!(a.seed(), 0xC0FFEE);
    }

    #[test]
    fn test_zero_base_never_waits() {
        let mut think_time = ThinkTime::new(Duration::ZERO, 1);
        assert_eq!(think_time.next_wait(), Duration::ZERO);
    }

    #[test]
    fn test_from_config_uses_seed() {
        let config = RoleConfig::default().with_seed(9);
        assert_eq!(ThinkTime::from_config(&config).seed(), 9);
    }

    #[test]
    fn test_worker_lifecycle() {
        let mut worker = Worker::new("tester");
        assert_eq!(worker.state(), RoleState::Idle);
        assert!(matches!(worker.join(), Err(QueueError::InvalidOperation(_))));

        worker.spawn(|| 5).unwrap();
        assert_ne!(worker.state(), RoleState::Idle);
        assert!(matches!(
            worker.spawn(|| 6),
            Err(QueueError::InvalidOperation(_))
        ));
        assert_eq!(worker.join().unwrap(), 5);
        assert_eq!(worker.state(), RoleState::Done);

        let err = worker.join().unwrap_err();
        assert_eq!(
            err,
            QueueError::InvalidOperation("tester already joined".to_string())
        );
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let mut worker: Worker<()> = Worker::new("doomed");
        worker.spawn(|| panic!("boom")).unwrap();
        assert_eq!(
            worker.join().unwrap_err(),
            QueueError::RolePanicked("doomed".to_string())
        );
    }
}
