//! Persisted role grants.
//!
//! Explicit grants (e.g. a data delegate for a class) live in the durable
//! store; implicit roles are computed, never persisted. See
//! [`compute_roles`](crate::roles::compute_roles).

use std::sync::Arc;

use rollbook_storage::{ClassId, StorageBackend, UserId, codec};

use crate::{
    error::AuthResult,
    keys,
    roles::{RoleGrant, RoleKind},
};

/// Typed repository for persisted role grants.
#[derive(Clone)]
pub struct GrantStore {
    backend: Arc<dyn StorageBackend>,
}

impl GrantStore {
    /// Creates a grant store over the given backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Grants `kind` over `class` to `user`. Idempotent.
    pub async fn grant(&self, user: UserId, kind: RoleKind, class: ClassId) -> AuthResult<()> {
        let record = RoleGrant { kind, class };
        self.backend.set(keys::grant_key(user, kind, class), codec::encode(&record)?).await?;
        Ok(())
    }

    /// Removes a grant. Removing a missing grant is not an error.
    pub async fn revoke(&self, user: UserId, kind: RoleKind, class: ClassId) -> AuthResult<()> {
        self.backend.delete(&keys::grant_key(user, kind, class)).await?;
        Ok(())
    }

    /// Lists all grants of `user`.
    pub async fn list(&self, user: UserId) -> AuthResult<Vec<RoleGrant>> {
        let mut out = Vec::new();
        for kv in self.backend.get_prefix(&keys::user_grants_prefix(user)).await? {
            out.push(codec::decode(&kv.value)?);
        }
        Ok(out)
    }
}
