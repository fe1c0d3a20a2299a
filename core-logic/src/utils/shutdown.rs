use crate::utils::logger::STATUS_TARGET;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Owns the process-wide running flag.
///
/// The flag is a [`CancellationToken`]: running means "not cancelled". The
/// transition happens once; later triggers are no-ops.
#[derive(Debug, Clone)]
pub struct ShutdownController {
    token: CancellationToken,
    grace: Duration,
}

impl ShutdownController {
    pub fn new(grace: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace,
        }
    }

    /// Handle observed by the scheduler.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Flips the running flag. Returns false if shutdown was already requested.
    pub fn trigger(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        info!(target: STATUS_TARGET, "🛑 Gracefully shutting down...");
        self.token.cancel();
        true
    }

    /// Spawns a task that listens for Ctrl+C and triggers shutdown.
    pub fn listen(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            loop {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        if !controller.trigger() {
                            warn!("Shutdown already in progress");
                        }
                    }
                    Err(err) => {
                        error!("Unable to listen for shutdown signal: {}", err);
                        break;
                    }
                }
            }
        });
    }

    /// Resolves once the grace period after shutdown has elapsed.
    pub async fn terminated(&self) {
        self.token.cancelled().await;
        sleep(self.grace).await;
    }
}
