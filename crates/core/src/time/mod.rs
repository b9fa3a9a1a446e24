pub mod refresh;

use chrono::{DateTime, Utc};

/// Injected clock so the cache's freshness policy is testable with pinned
/// times.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
