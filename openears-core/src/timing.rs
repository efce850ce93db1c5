use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Represents a source of time and delay.
///
/// Every simulated latency in the system goes through this, so tests can run
/// with a fixed clock and zero-cost waits.
#[async_trait]
pub trait Timing: Send + Sync + 'static {
    /// The current moment according to this source
    fn now(&self) -> DateTime<Utc>;

    /// Completes after the given duration has passed
    async fn wait(&self, duration: Duration);
}
