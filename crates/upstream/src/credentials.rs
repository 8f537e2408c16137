//! Upstream credential records and their repository.
//!
//! One (soft) record per user. The stored form keeps the secret pair as
//! plain optionals — either half may be missing after a partial login —
//! while the in-memory pair handed to the client is zeroizing. Records are
//! owned by the sweeper: found invalid, they are deleted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rollbook_storage::{StorageBackend, StorageResult, UserId, codec};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::client::SessionPair;

const ID_WIDTH: usize = 6;

fn credential_key(user: UserId) -> Vec<u8> {
    format!("credential/{:0ID_WIDTH$}", user.0).into_bytes()
}

fn credential_prefix() -> Vec<u8> {
    b"credential/".to_vec()
}

/// A stored upstream session for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Owning user.
    pub user: UserId,
    /// The `sessionid` cookie half, when captured.
    pub session_id: Option<String>,
    /// The `csrftoken` cookie half, when captured.
    pub session_token: Option<String>,
    /// When the credentials were stored or last refreshed.
    pub stored_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// The session pair, if both halves are present.
    ///
    /// An incomplete pair cannot possibly authenticate upstream, so the
    /// sweeper treats `None` as definitively invalid.
    #[must_use]
    pub fn session_pair(&self) -> Option<SessionPair> {
        match (&self.session_id, &self.session_token) {
            (Some(id), Some(token)) => Some(SessionPair {
                id: Zeroizing::new(id.clone()),
                token: Zeroizing::new(token.clone()),
            }),
            _ => None,
        }
    }
}

/// Typed repository for upstream credentials.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn StorageBackend>,
}

impl CredentialStore {
    /// Creates a credential store over the given backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Stores or replaces the credentials of `record.user`.
    pub async fn put(&self, record: &CredentialRecord) -> StorageResult<()> {
        self.backend.set(credential_key(record.user), codec::encode(record)?).await
    }

    /// Fetches the credentials of `user`, if stored.
    pub async fn get(&self, user: UserId) -> StorageResult<Option<CredentialRecord>> {
        match self.backend.get(&credential_key(user)).await? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Deletes the credentials of `user`. Missing records are not an error.
    pub async fn delete(&self, user: UserId) -> StorageResult<()> {
        self.backend.delete(&credential_key(user)).await
    }

    /// Snapshot of every stored credential record, ordered by user.
    ///
    /// This is the sweep work queue: records registered after the snapshot
    /// are picked up by the next sweep, not the running one.
    pub async fn all(&self) -> StorageResult<Vec<CredentialRecord>> {
        let mut out = Vec::new();
        for kv in self.backend.get_prefix(&credential_prefix()).await? {
            out.push(codec::decode(&kv.value)?);
        }
        Ok(out)
    }
}
