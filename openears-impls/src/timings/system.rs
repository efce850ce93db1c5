use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use openears_core::Timing;

/// The timing source used outside of tests: the real clock and real sleeps
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTiming;

#[async_trait]
impl Timing for SystemTiming {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}
