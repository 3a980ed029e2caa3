use std::time::Duration;

/// Tuning for ledger write operations.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How many times a transaction that hit a store conflict is replayed.
    pub max_retries: u32,
    /// Base delay between replays, multiplied by the attempt number.
    pub retry_backoff: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

impl LedgerConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
