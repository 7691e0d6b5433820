use crate::QueueError;
use std::time::Duration;

/// Settings shared by the producer and consumer drivers.
#[derive(Clone, Debug, PartialEq)]
pub struct RoleConfig {
    /// Values to produce or consume before the role finishes.
    pub item_count: u64,
    /// Think-times are drawn from `[base_wait, 2 * base_wait)`. Zero disables them.
    pub base_wait: Duration,
    /// Seed for the role's think-time generator. `None` picks a random one.
    pub seed: Option<u64>,
}

impl RoleConfig {
    pub fn validate(&self) -> Result<(), QueueError> {
        let micros = u64::try_from(self.base_wait.as_micros()).map_err(|_| {
            QueueError::InvalidConfiguration("base_wait does not fit in u64 microseconds".to_string())
        })?;
        if micros.checked_mul(2).is_none() {
            return Err(QueueError::InvalidConfiguration(
                "base_wait is too large to double".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_item_count(mut self, count: u64) -> Self {
        self.item_count = count;
        self
    }

    pub fn with_base_wait(mut self, wait: Duration) -> Self {
        self.base_wait = wait;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            item_count: 30,
            base_wait: Duration::from_millis(500),
            seed: None,
        }
    }
}
