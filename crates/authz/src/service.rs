//! Cached, store-backed role resolution.
//!
//! [`RoleService`] glues the pure [`compute_roles`](crate::roles::compute_roles)
//! function to its data sources: persisted grants from the
//! [`GrantStore`](crate::grants::GrantStore), and class/timetable facts from
//! an injected [`RoleDirectory`]. Results are cached per user with a TTL
//! bounded by the soonest-expiring assignment.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use rollbook_storage::{ClassId, StorageResult, UserId};

use crate::{
    error::AuthResult,
    grants::GrantStore,
    role_cache::RoleCache,
    roles::{LessonSlot, RoleAssignment, UserKind, compute_roles},
};

/// Source of the class/timetable facts role computation needs.
///
/// Implemented over the school registry and timetable store; kept as a
/// trait so role computation stays testable without either.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// The class a pupil is enrolled in, if any.
    async fn pupil_class(&self, user: UserId) -> StorageResult<Option<ClassId>>;

    /// The class a teacher owns as class teacher, if any.
    async fn own_class(&self, user: UserId) -> StorageResult<Option<ClassId>>;

    /// The user's own timetable for today, in timetable order.
    async fn todays_lessons(&self, user: UserId) -> StorageResult<Vec<LessonSlot>>;
}

/// Computes and caches role lists.
#[derive(Clone)]
pub struct RoleService {
    grants: GrantStore,
    directory: Arc<dyn RoleDirectory>,
    cache: RoleCache,
}

impl RoleService {
    /// Creates a role service over the given grant store and directory.
    pub fn new(grants: GrantStore, directory: Arc<dyn RoleDirectory>) -> Self {
        Self { grants, directory, cache: RoleCache::new() }
    }

    /// Resolves the role list for `user`, serving from cache when possible.
    ///
    /// Uses the current local wall-clock time for lesson-interval matching.
    pub async fn roles(
        &self,
        user: UserId,
        user_kind: UserKind,
    ) -> AuthResult<Arc<Vec<RoleAssignment>>> {
        self.roles_at(user, user_kind, chrono::Local::now().time()).await
    }

    /// Like [`roles`](Self::roles) with an explicit "now", for deterministic
    /// tests.
    pub async fn roles_at(
        &self,
        user: UserId,
        user_kind: UserKind,
        now: NaiveTime,
    ) -> AuthResult<Arc<Vec<RoleAssignment>>> {
        if let Some(cached) = self.cache.get(user).await {
            return Ok(cached);
        }

        let grants = self.grants.list(user).await?;
        let pupil_class = if user_kind == UserKind::Pupil {
            self.directory.pupil_class(user).await?
        } else {
            None
        };
        let (own_class, todays_lessons) =
            if matches!(user_kind, UserKind::Teacher | UserKind::Administration) {
                (self.directory.own_class(user).await?, self.directory.todays_lessons(user).await?)
            } else {
                (None, Vec::new())
            };

        let roles =
            compute_roles(user_kind, now, &grants, pupil_class, own_class, &todays_lessons);
        Ok(self.cache.insert(user, roles).await)
    }

    /// Drops the cached role list for `user` (e.g. after a grant change).
    pub async fn invalidate(&self, user: UserId) {
        self.cache.invalidate(user).await;
    }
}
