//! Upstream push seam.
//!
//! After a batch commits locally, the engine offers it to an
//! [`UpstreamSink`]. The upstream service stopped accepting absence writes,
//! so the only shipped implementation is [`NullSink`]; the call site and its
//! failure isolation are kept so a future sink can be dropped in without
//! touching the engine. Push failures are logged and never affect the local
//! commit.

use async_trait::async_trait;
use thiserror::Error;

use crate::records::PlacementJob;

/// Error returned by a sink push.
#[derive(Debug, Error)]
#[error("upstream push failed: {0}")]
pub struct SinkError(pub String);

/// Destination for locally-committed placement batches.
#[async_trait]
pub trait UpstreamSink: Send + Sync {
    /// Pushes a committed batch upstream.
    ///
    /// Called strictly after the local transaction commits. Implementations
    /// must not assume the call retries; the engine treats an `Err` as
    /// log-and-continue.
    async fn push(&self, jobs: &[PlacementJob]) -> Result<(), SinkError>;
}

/// Sink that accepts and discards every batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl UpstreamSink for NullSink {
    async fn push(&self, jobs: &[PlacementJob]) -> Result<(), SinkError> {
        tracing::debug!(jobs = jobs.len(), "upstream sink disabled, batch not forwarded");
        Ok(())
    }
}
