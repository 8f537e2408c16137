//! Upstream availability monitor.
//!
//! A fixed-interval probe loop with the state machine
//! `Unknown → Available ⇄ Unavailable`. Every probe completion publishes
//! the resulting boolean to all broadcast subscribers — transition or not —
//! and advances the shared [`SharedAvailability`] state. A transition is
//! logged only when the boolean actually changes.
//!
//! # Fan-out
//!
//! Publication uses a [`tokio::sync::broadcast`] channel: each subscriber
//! has its own bounded buffer, and a subscriber that falls behind loses the
//! oldest updates (observing [`RecvError::Lagged`](tokio::sync::broadcast::error::RecvError::Lagged))
//! rather than ever blocking the probe loop.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{client::UpstreamClient, config::MonitorConfig, state::SharedAvailability};

/// Capacity of each subscriber's broadcast buffer. Availability changes a
/// few times a day; a subscriber more than 16 updates behind only needs
/// the newest ones anyway.
const BROADCAST_CAPACITY: usize = 16;

/// Probe state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// No probe has completed yet.
    Unknown,
    /// Last probe returned HTTP 200.
    Available,
    /// Last probe timed out, failed to connect, or returned non-200.
    Unavailable,
}

impl ProbeState {
    /// The boolean this state publishes; `Unknown` leans on the optimistic
    /// startup assumption.
    fn as_bool(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Periodic availability prober and publisher.
pub struct AvailabilityMonitor {
    client: Arc<dyn UpstreamClient>,
    state: SharedAvailability,
    probe_interval: Duration,
    sender: broadcast::Sender<bool>,
    probe_state: Mutex<ProbeState>,
}

impl AvailabilityMonitor {
    /// Creates a monitor over the given client and shared state.
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        state: SharedAvailability,
        config: &MonitorConfig,
    ) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            client,
            state,
            probe_interval: config.probe_interval,
            sender,
            probe_state: Mutex::new(ProbeState::Unknown),
        }
    }

    /// Subscribes to probe results. Every completed probe delivers one
    /// boolean; slow subscribers drop oldest values, never block the loop.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.sender.subscribe()
    }

    /// The current probe state.
    #[must_use]
    pub fn probe_state(&self) -> ProbeState {
        *self.probe_state.lock()
    }

    /// Runs a single probe cycle: probe, update shared state, publish.
    ///
    /// Exposed so tests (and a forced re-check) can drive the monitor
    /// without the timer.
    pub async fn tick(&self) -> bool {
        let available = self.client.probe().await;
        let until_next = chrono::Duration::from_std(self.probe_interval)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        self.state.update(available, Utc::now() + until_next);

        let next = if available { ProbeState::Available } else { ProbeState::Unavailable };
        let previous = {
            let mut guard = self.probe_state.lock();
            std::mem::replace(&mut *guard, next)
        };
        if previous.as_bool() != next.as_bool() {
            tracing::info!(
                previous = ?previous,
                available,
                "upstream availability changed",
            );
        }

        // Err only means "no subscribers right now"; publication is
        // fire-and-forget either way.
        let _ = self.sender.send(available);
        available
    }

    /// Long-running probe loop. Probes immediately, then every configured
    /// interval, until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.probe_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("availability monitor stopping");
                    break;
                },
                _ = interval.tick() => {
                    self.tick().await;
                },
            }
        }
    }
}
