//! Retry logic for contended batch commits.
//!
//! Concurrent batches touching the same class-day serialize through the
//! storage layer's conflict detection; the loser re-reads and retries here.
//! Backoff is exponential with 0–50% jitter to avoid lockstep retries from
//! concurrent submitters.

use std::time::Duration;

use rand::Rng;

use crate::error::LedgerError;

/// Retry behavior for `apply_batch` commits.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Additional attempts after the first (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Backoff before the first retry; doubles each attempt.
    pub initial_backoff: Duration,
    /// Backoff cap.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// Whether `error` is worth another attempt.
    ///
    /// Conflicts are retryable here — and only here — because each attempt
    /// re-reads the contended keys from scratch. Transient backend errors
    /// are retryable as usual; validation errors never are.
    pub(crate) fn should_retry(error: &LedgerError) -> bool {
        match error {
            LedgerError::Storage(e) => {
                matches!(e, rollbook_storage::StorageError::Conflict) || e.is_transient()
            },
            _ => false,
        }
    }

    pub(crate) fn backoff(&self, attempt: u32) -> Duration {
        let base =
            self.initial_backoff.saturating_mul(1_u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = base.min(self.max_backoff);

        // Add jitter: 0–50% of the computed delay
        let jitter_range = capped.as_millis() as u64 / 2;
        if jitter_range > 0 {
            let jitter = rand::rng().random_range(0..=jitter_range);
            capped + Duration::from_millis(jitter)
        } else {
            capped
        }
    }
}

#[cfg(test)]
mod tests {
    use rollbook_storage::StorageError;

    use super::*;

    #[test]
    fn conflicts_and_transients_retry_validation_does_not() {
        assert!(RetryConfig::should_retry(&LedgerError::Storage(StorageError::Conflict)));
        assert!(RetryConfig::should_retry(&LedgerError::Storage(StorageError::connection(
            "reset"
        ))));
        assert!(!RetryConfig::should_retry(&LedgerError::EmptyBatch));
    }

    #[test]
    fn backoff_is_capped() {
        let config = RetryConfig::default();
        // With 50% jitter the delay never exceeds 1.5x the cap.
        let delay = config.backoff(20);
        assert!(delay <= config.max_backoff + config.max_backoff / 2);
    }
}
