//! Credential lifecycle sweeper.
//!
//! On its own timer, revalidates every stored upstream credential. A
//! definitively-invalid credential costs the user their credential record
//! and every access token (bulk revoke, reason
//! `AUTO_CREDENTIALS_INVALID`). An *indeterminate* check — timeout,
//! transport failure, odd status — leaves the credential untouched:
//! a user wrongly locked out is worse than a stale session surviving one
//! more cycle (fail-open).
//!
//! The whole sweep is gated on upstream availability. If the monitor says
//! unavailable at tick time, the sweep is skipped outright; there is no
//! partial sweep.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rollbook_authz::TokenService;
use rollbook_storage::StorageResult;
use tokio_util::sync::CancellationToken;

use crate::{
    client::UpstreamClient, config::SweepConfig, credentials::CredentialStore,
    state::SharedAvailability,
};

/// Revocation reason recorded for automatically invalidated credentials.
pub const AUTO_REVOKE_REASON: &str = "AUTO_CREDENTIALS_INVALID";

/// Outcome of one sweep, retrievable via
/// [`CredentialSweeper::last_sweep`] for operational inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// When the sweep finished.
    pub finished_at: DateTime<Utc>,
    /// Credentials examined.
    pub checked: usize,
    /// Users whose tokens were revoked.
    pub revoked_users: usize,
    /// Whether the sweep was skipped because the upstream was unavailable.
    pub skipped: bool,
}

/// Periodic credential revalidation.
pub struct CredentialSweeper {
    store: CredentialStore,
    client: Arc<dyn UpstreamClient>,
    tokens: TokenService,
    availability: SharedAvailability,
    sweep_interval: Duration,
    last_sweep: Mutex<Option<SweepReport>>,
}

impl CredentialSweeper {
    /// Creates a sweeper over the given collaborators.
    pub fn new(
        store: CredentialStore,
        client: Arc<dyn UpstreamClient>,
        tokens: TokenService,
        availability: SharedAvailability,
        config: &SweepConfig,
    ) -> Self {
        Self {
            store,
            client,
            tokens,
            availability,
            sweep_interval: config.sweep_interval,
            last_sweep: Mutex::new(None),
        }
    }

    /// The report of the most recent sweep, if any has run.
    #[must_use]
    pub fn last_sweep(&self) -> Option<SweepReport> {
        *self.last_sweep.lock()
    }

    /// Runs one sweep to completion (or skips it when the upstream is
    /// unavailable) and records the report.
    ///
    /// # Errors
    ///
    /// Only snapshotting the work queue can fail; everything past that
    /// point is fail-open per credential.
    pub async fn sweep_once(&self) -> StorageResult<SweepReport> {
        if !self.availability.is_available() {
            tracing::warn!("credential sweep skipped: upstream unavailable");
            return Ok(self.finish(0, 0, true));
        }

        tracing::info!("starting upstream credential validity sweep");
        let queue = self.store.all().await?;
        let mut checked = 0_usize;
        let mut revoked_users = 0_usize;

        for record in queue {
            // The upstream can go down mid-sweep; stop draining rather
            // than misread the resulting errors.
            if !self.availability.is_available() {
                tracing::warn!(checked, "upstream became unavailable mid-sweep, stopping early");
                break;
            }
            checked += 1;

            let invalid = match record.session_pair() {
                // Half a pair can never authenticate; no need to ask.
                None => true,
                Some(pair) => match self.client.check_credentials(&pair).await {
                    Ok(valid) => !valid,
                    Err(err) => {
                        tracing::debug!(
                            user = %record.user,
                            error = %err,
                            "credential check indeterminate, leaving untouched",
                        );
                        false
                    },
                },
            };
            if !invalid {
                continue;
            }

            match self.tokens.revoke_all(record.user, Some(AUTO_REVOKE_REASON)).await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(
                            user = %record.user,
                            count,
                            "invalidated tokens: upstream credentials no longer valid",
                        );
                        revoked_users += 1;
                    }
                },
                Err(err) => {
                    // Leave the credential in place so the next sweep
                    // retries the whole revocation.
                    tracing::error!(user = %record.user, error = %err, "bulk revoke failed");
                    continue;
                },
            }
            if let Err(err) = self.store.delete(record.user).await {
                tracing::error!(user = %record.user, error = %err, "failed to delete credential");
            }
        }

        let report = self.finish(checked, revoked_users, false);
        tracing::info!(
            checked = report.checked,
            revoked_users = report.revoked_users,
            "credential sweep finished",
        );
        Ok(report)
    }

    fn finish(&self, checked: usize, revoked_users: usize, skipped: bool) -> SweepReport {
        let report = SweepReport { finished_at: Utc::now(), checked, revoked_users, skipped };
        *self.last_sweep.lock() = Some(report);
        report
    }

    /// Long-running sweep loop: one sweep per interval until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The immediate first tick is consumed so the first sweep happens
        // one full interval after startup, giving the monitor a chance to
        // publish a real availability verdict first.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("credential sweeper stopping");
                    break;
                },
                _ = interval.tick() => {
                    if let Err(err) = self.sweep_once().await {
                        tracing::error!(error = %err, "credential sweep aborted");
                    }
                },
            }
        }
    }
}
