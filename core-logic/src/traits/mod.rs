use crate::config::AccountEntry;
use crate::error::ConfigError;
use async_trait::async_trait;

/// Success/failure counters for one pass over the accounts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub success: u64,
    pub failed: u64,
}

impl CycleStats {
    pub fn total(&self) -> u64 {
        self.success + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.success as f64 / self.total() as f64) * 100.0
        }
    }
}

#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Load the account list. The list is fixed for the lifetime of the process.
    async fn load_accounts(&self) -> Result<Vec<AccountEntry>, ConfigError>;
}
