//! Shared availability state.
//!
//! One value per process, constructed at startup and injected into every
//! component that reads it (reconciliation gating, credential sweeper) or
//! writes it (the availability monitor). Never persisted; rebuilt
//! optimistically on every run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Point-in-time view of upstream availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    /// Whether the upstream answered its last probe.
    pub available: bool,
    /// When the next probe is due.
    pub next_check: DateTime<Utc>,
}

/// Cheaply cloneable handle to the process-wide availability state.
///
/// Only the availability monitor writes; everyone else reads.
#[derive(Clone)]
pub struct SharedAvailability {
    inner: Arc<RwLock<AvailabilitySnapshot>>,
}

impl SharedAvailability {
    /// Creates the state in its optimistic initial form: available, next
    /// check due now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AvailabilitySnapshot {
                available: true,
                next_check: Utc::now(),
            })),
        }
    }

    /// Whether the upstream is currently considered available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.read().available
    }

    /// The full current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AvailabilitySnapshot {
        *self.inner.read()
    }

    pub(crate) fn update(&self, available: bool, next_check: DateTime<Utc>) {
        *self.inner.write() = AvailabilitySnapshot { available, next_check };
    }
}

impl Default for SharedAvailability {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_optimistic() {
        assert!(SharedAvailability::new().is_available());
    }

    #[test]
    fn update_is_visible_to_clones() {
        let state = SharedAvailability::new();
        let observer = state.clone();
        state.update(false, Utc::now());
        assert!(!observer.is_available());
    }
}
