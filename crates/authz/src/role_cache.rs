//! Role cache with per-entry TTL.
//!
//! A cached role list must not outlive its shortest-lived assignment: a
//! lesson-teacher role granted for the last 120 seconds of a lesson caps
//! the whole entry at 120 seconds, not the default TTL. Entries with no
//! time-bounded assignment keep the default one-hour lifetime.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use moka::future::Cache;
use rollbook_storage::UserId;

use crate::roles::RoleAssignment;

/// Default TTL for role lists with no time-bounded assignment.
pub const DEFAULT_ROLE_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of cached role lists.
pub const DEFAULT_ROLE_CACHE_CAPACITY: u64 = 10_000;

/// Per-entry expiry: the soonest `expire_in` among the assignments, or the
/// default TTL when none carries an expiry.
struct RoleExpiry;

impl RoleExpiry {
    fn ttl_for(value: &[RoleAssignment]) -> Duration {
        value.iter().filter_map(|r| r.expire_in).min().unwrap_or(DEFAULT_ROLE_TTL)
    }
}

impl moka::Expiry<UserId, Arc<Vec<RoleAssignment>>> for RoleExpiry {
    fn expire_after_create(
        &self,
        _key: &UserId,
        value: &Arc<Vec<RoleAssignment>>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::ttl_for(value))
    }

    fn expire_after_update(
        &self,
        _key: &UserId,
        value: &Arc<Vec<RoleAssignment>>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::ttl_for(value))
    }
}

/// In-memory cache of computed role lists, keyed by user.
///
/// # Thread Safety
///
/// `RoleCache` is `Send + Sync` and safe for concurrent use from multiple
/// async tasks. Clones share the underlying cache.
#[derive(Clone)]
pub struct RoleCache {
    cache: Cache<UserId, Arc<Vec<RoleAssignment>>>,
}

impl RoleCache {
    /// Creates a cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(DEFAULT_ROLE_CACHE_CAPACITY)
            .expire_after(RoleExpiry)
            .build();
        Self { cache }
    }

    /// Returns the cached role list for `user`, if present and unexpired.
    pub async fn get(&self, user: UserId) -> Option<Arc<Vec<RoleAssignment>>> {
        self.cache.get(&user).await
    }

    /// Caches a freshly computed role list.
    pub async fn insert(&self, user: UserId, roles: Vec<RoleAssignment>) -> Arc<Vec<RoleAssignment>> {
        let roles = Arc::new(roles);
        self.cache.insert(user, Arc::clone(&roles)).await;
        roles
    }

    /// Drops the cached role list for `user`.
    pub async fn invalidate(&self, user: UserId) {
        self.cache.invalidate(&user).await;
    }
}

impl Default for RoleCache {
    fn default() -> Self {
        Self::new()
    }
}
