use std::time::{Duration, Instant};

/// How long a blocking put or get may wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timeout {
    /// Give up once this much time has passed. A zero duration never waits.
    After(Duration),
    /// Block until the operation can complete.
    Forever,
}

impl Timeout {
    pub const ZERO: Timeout = Timeout::After(Duration::ZERO);

    pub fn from_micros(micros: u64) -> Self {
        Timeout::After(Duration::from_micros(micros))
    }

    pub fn from_millis(millis: u64) -> Self {
        Timeout::After(Duration::from_millis(millis))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Timeout::After(d) if d.is_zero())
    }

    pub fn is_forever(&self) -> bool {
        matches!(self, Timeout::Forever)
    }

    /// The instant at which a wait started at `now` expires. `None` means no
    /// deadline, including durations too large for `Instant` to represent.
    pub(crate) fn deadline_from(&self, now: Instant) -> Option<Instant> {
        match self {
            Timeout::After(d) => now.checked_add(*d),
            Timeout::Forever => None,
        }
    }

    /// Duration reported in a `QueueError::Timeout`.
    pub(crate) fn duration(&self) -> Duration {
        match self {
            Timeout::After(d) => *d,
            Timeout::Forever => Duration::MAX,
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::After(d)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Timeout::Forever, Timeout::After)
    }
}
