use std::time::Duration;

/// Default bound on row-lock waits, in milliseconds.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Settings passed to [`BookingEngine::new`](super::BookingEngine::new).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Longest a transaction waits for a row lock before failing with a
    /// retryable error. Applied per transaction via `lock_timeout`.
    pub lock_timeout: Duration,
}

impl EngineConfig {
    /// Load engine configuration from environment variables.
    ///
    /// | Env Var           | Default |
    /// |-------------------|---------|
    /// | `LOCK_TIMEOUT_MS` | `5000`  |
    pub fn from_env() -> Self {
        let lock_timeout_ms: u64 = std::env::var("LOCK_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_LOCK_TIMEOUT_MS.to_string())
            .parse()
            .expect("LOCK_TIMEOUT_MS must be a valid u64");

        Self {
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        }
    }

    /// `lock_timeout` formatted for `set_config`. Never zero, since zero
    /// disables the timeout in PostgreSQL.
    pub fn lock_timeout_setting(&self) -> String {
        format!("{}ms", self.lock_timeout.as_millis().max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}
