//! # Core Logic - Request Pacing
//!
//! Minimum spacing between consecutive requests issued by the same client.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Enforces a minimum gap between consecutive attempts.
///
/// The clock advances on every completed attempt, successful or not.
#[derive(Debug, Clone)]
pub struct PingPacer {
    min_interval: Duration,
    last_attempt: Option<Instant>,
}

impl PingPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_attempt: None,
        }
    }

    /// Time left before the next attempt is allowed.
    pub fn remaining(&self) -> Duration {
        match self.last_attempt {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Suspends until the spacing has elapsed. Returns how long it waited.
    pub async fn wait_turn(&self) -> Duration {
        let wait = self.remaining();
        if !wait.is_zero() {
            debug!("Pacing: waiting {}ms before next ping", wait.as_millis());
            sleep(wait).await;
        }
        wait
    }

    /// Records a completed attempt.
    pub fn mark(&mut self) {
        self.last_attempt = Some(Instant::now());
    }
}
