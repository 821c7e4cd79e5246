//! Time source for deadline guards and position timestamps
//!
//! Pools read the current unix time through [`Clock`] so deadline handling is exactly
//! reproducible under test: [`ManualClock`] holds a shared atomic that tests and
//! simulators move forward explicitly, while [`SystemClock`] reads wall time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current unix time in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Shared clock handle held by each pool
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to
///
/// Clones share the same underlying time, so a test can keep one handle and hand
/// another to the pool.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_secs: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_secs: u64) -> Self {
        Self {
            now_secs: Arc::new(AtomicU64::new(start_secs)),
        }
    }

    pub fn set(&self, secs: u64) {
        self.now_secs.store(secs, Ordering::Release);
    }

    pub fn advance(&self, secs: u64) {
        self.now_secs.fetch_add(secs, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now_secs.load(Ordering::Acquire)
    }
}
