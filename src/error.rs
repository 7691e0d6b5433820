use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error("Queue is full")]
    Full,
    #[error("Queue is empty")]
    Empty,
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Value {value} consumed at position {index}")]
    OutOfOrder { index: u64, value: u64 },
    #[error("The {0} thread panicked")]
    RolePanicked(String),
    #[error("Failed to spawn thread: {0}")]
    SpawnFailed(String),
}

impl QueueError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            QueueError::Full | QueueError::Empty | QueueError::Timeout(_)
        )
    }

    /// True for the conditions a non-blocking call reports instead of waiting.
    pub fn is_would_block(&self) -> bool {
        matches!(self, QueueError::Full | QueueError::Empty)
    }
}

pub type QueueResult<T> = Result<T, QueueError>;

/// A put that did not go through. Carries the rejected value back to the
/// caller so it can be retried without cloning.
pub struct PutError<T> {
    value: T,
    reason: QueueError,
}

impl<T> PutError<T> {
    pub(crate) fn new(value: T, reason: QueueError) -> Self {
        Self { value, reason }
    }

    pub fn reason(&self) -> &QueueError {
        &self.reason
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, QueueError) {
        (self.value, self.reason)
    }
}

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutError")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "put rejected: {}", self.reason)
    }
}

impl<T> std::error::Error for PutError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

impl<T> From<PutError<T>> for QueueError {
    fn from(err: PutError<T>) -> Self {
        err.reason
    }
}
