//! Availability monitor behavior: state machine, shared state updates,
//! broadcast fan-out and loop cancellation.

#![allow(clippy::expect_used, clippy::panic)]

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use rollbook_upstream::{
    AvailabilityMonitor, MonitorConfig, ProbeState, SessionPair, SharedAvailability,
    UpstreamClient, UpstreamError,
};
use tokio_util::sync::CancellationToken;

/// Upstream stub with a scripted sequence of probe answers.
struct ScriptedClient {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    probes: AtomicUsize,
}

impl ScriptedClient {
    fn new(script: impl IntoIterator<Item = bool>, fallback: bool) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            probes: AtomicUsize::new(0),
        })
    }

    fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamClient for ScriptedClient {
    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or(self.fallback)
    }

    async fn check_credentials(&self, _pair: &SessionPair) -> Result<bool, UpstreamError> {
        Ok(true)
    }
}

fn config(probe_interval: Duration) -> MonitorConfig {
    MonitorConfig::builder()
        .base_url("https://upstream.example".to_owned())
        .probe_interval(probe_interval)
        .build()
        .expect("valid config")
}

#[tokio::test]
async fn failed_probe_marks_unavailable_and_publishes() {
    let client = ScriptedClient::new([false], false);
    let state = SharedAvailability::new();
    let monitor = AvailabilityMonitor::new(client, state.clone(), &config(Duration::from_secs(900)));
    let mut sub = monitor.subscribe();

    assert!(state.is_available(), "initial state is optimistic");
    assert_eq!(monitor.probe_state(), ProbeState::Unknown);

    let before = state.snapshot().next_check;
    assert!(!monitor.tick().await);

    assert!(!state.is_available());
    assert_eq!(monitor.probe_state(), ProbeState::Unavailable);
    assert!(state.snapshot().next_check > before, "next check must advance");
    assert_eq!(sub.recv().await.expect("published"), false);
}

#[tokio::test]
async fn recovery_flips_back_to_available() {
    let client = ScriptedClient::new([false, true], true);
    let state = SharedAvailability::new();
    let monitor = AvailabilityMonitor::new(client, state.clone(), &config(Duration::from_secs(900)));

    monitor.tick().await;
    assert_eq!(monitor.probe_state(), ProbeState::Unavailable);

    monitor.tick().await;
    assert_eq!(monitor.probe_state(), ProbeState::Available);
    assert!(state.is_available());
}

/// Every subscriber observes every probe completion, transitions or not.
#[tokio::test]
async fn all_subscribers_see_every_update() {
    let client = ScriptedClient::new([true, true, false], false);
    let monitor =
        AvailabilityMonitor::new(client, SharedAvailability::new(), &config(Duration::from_secs(900)));

    let mut first = monitor.subscribe();
    let mut second = monitor.subscribe();

    for _ in 0..3 {
        monitor.tick().await;
    }

    for sub in [&mut first, &mut second] {
        assert_eq!(sub.recv().await.expect("update 1"), true);
        assert_eq!(sub.recv().await.expect("update 2"), true);
        assert_eq!(sub.recv().await.expect("update 3"), false);
    }
}

/// A subscriber that stops receiving only degrades itself: the loop keeps
/// publishing, and the laggard sees a lag marker then the newest values.
#[tokio::test]
async fn slow_subscriber_lags_without_blocking() {
    let client = ScriptedClient::new([], true);
    let monitor =
        AvailabilityMonitor::new(client, SharedAvailability::new(), &config(Duration::from_secs(900)));
    let mut laggard = monitor.subscribe();

    // Publish well past the per-subscriber buffer capacity.
    for _ in 0..40 {
        monitor.tick().await;
    }

    match laggard.recv().await {
        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
            assert!(skipped > 0, "oldest updates must have been dropped");
        },
        other => panic!("expected lag marker, got {other:?}"),
    }
    // After the lag marker the subscriber is back in business.
    assert_eq!(laggard.recv().await.expect("fresh value"), true);
}

/// The probe loop runs on its interval and stops promptly on cancellation.
#[tokio::test]
async fn run_loop_probes_until_cancelled() {
    let client = ScriptedClient::new([], true);
    let monitor = Arc::new(AvailabilityMonitor::new(
        client.clone(),
        SharedAvailability::new(),
        &config(Duration::from_millis(50)),
    ));

    let cancel = CancellationToken::new();
    let handle = {
        let monitor = Arc::clone(&monitor);
        let cancel = cancel.clone();
        tokio::spawn(async move { monitor.run(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(180)).await;
    cancel.cancel();
    handle.await.expect("loop task must exit cleanly");

    assert!(client.probes() >= 2, "expected repeated probes, got {}", client.probes());
}
