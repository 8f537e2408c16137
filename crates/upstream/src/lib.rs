//! # Rollbook Upstream
//!
//! Integration with the frequently-unreliable upstream service:
//!
//! - **Availability monitor**: fixed-interval probe loop publishing the upstream's reachability
//!   to all subscribers and into a shared, injected state value
//! - **Credential lifecycle**: storage of upstream session credentials and a periodic,
//!   availability-gated, fail-open revalidation sweep that bulk-revokes tokens of users whose
//!   sessions went stale
//! - **Upstream client**: the [`UpstreamClient`] trait, with an HTTP implementation carrying
//!   bounded connect/request timeouts
//!
//! Both background loops take a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and expose
//! their tick bodies ([`AvailabilityMonitor::tick`],
//! [`CredentialSweeper::sweep_once`]) so tests drive them deterministically.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod monitor;
pub mod state;
pub mod sweeper;

pub use client::{HttpUpstreamClient, SessionPair, UpstreamClient};
pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROBE_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SWEEP_INTERVAL, MonitorConfig, SweepConfig,
};
pub use credentials::{CredentialRecord, CredentialStore};
pub use error::UpstreamError;
pub use monitor::{AvailabilityMonitor, ProbeState};
pub use state::{AvailabilitySnapshot, SharedAvailability};
pub use sweeper::{AUTO_REVOKE_REASON, CredentialSweeper, SweepReport};
