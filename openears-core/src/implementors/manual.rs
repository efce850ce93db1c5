use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use crate::Timing;

/// A timing source with a hand-set clock and instant waits.
///
/// Used by tests to make every simulated latency deterministic.
pub struct ManualTiming {
    now: Mutex<DateTime<Utc>>,
}

impl ManualTiming {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Moves the clock to the given moment
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Moves the clock forward by the given duration
    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock();
        *now += duration;
    }
}

impl Default for ManualTiming {
    fn default() -> Self {
        // An arbitrary but fixed moment, so assertions have a stable clock
        Self::at(Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single().expect("valid moment"))
    }
}

#[async_trait]
impl Timing for ManualTiming {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    async fn wait(&self, _duration: Duration) {}
}
