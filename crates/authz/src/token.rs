//! Access token issuance, validation and revocation.
//!
//! Tokens are opaque UUID strings, unique across both the live store and
//! the banned set. Revoked tokens are never deleted: they move into the
//! banned set with a reason, so replays are rejected explicitly and the
//! revocation trail stays auditable.
//!
//! # Validation path
//!
//! `check_token` is on every authenticated request, so positive results are
//! cached in a short-TTL [`moka`] cache. A cache hit only ever means
//! "valid"; misses and any doubt fall through to the durable store, which
//! is authoritative. Revocation invalidates the cache entry before
//! returning — after `revoke_one`/`revoke_all` return, no stale "valid"
//! answer is possible.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use rollbook_storage::{StorageBackend, StorageError, Transaction as _, UserId, codec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AuthResult, keys};

/// Default TTL of the positive-result validation cache.
pub const DEFAULT_TOKEN_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default capacity of the positive-result validation cache.
pub const DEFAULT_TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// Revocation reason recorded when none is supplied.
const DEFAULT_BAN_REASON: &str = "Unknown";

/// A live access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Owning user.
    pub user: UserId,
    /// Opaque token string (UUID v4).
    pub token: String,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Device tag supplied at login, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_os: Option<String>,
}

/// A revoked token, retained for auditability and explicit replay
/// rejection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedToken {
    /// User the token belonged to.
    pub user: UserId,
    /// The revoked token string.
    pub token: String,
    /// Why the token was revoked.
    pub reason: String,
    /// Revocation timestamp.
    pub banned_at: DateTime<Utc>,
}

/// Issues, validates and revokes access tokens over an injected backend.
///
/// Cheaply cloneable; clones share the backend and the validation cache.
#[derive(Clone)]
pub struct TokenService {
    backend: Arc<dyn StorageBackend>,
    valid_cache: Cache<(UserId, String), ()>,
}

impl TokenService {
    /// Creates a token service with the default cache TTL.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_cache_ttl(backend, DEFAULT_TOKEN_CACHE_TTL)
    }

    /// Creates a token service with a custom positive-result cache TTL.
    pub fn with_cache_ttl(backend: Arc<dyn StorageBackend>, ttl: Duration) -> Self {
        let valid_cache = Cache::builder()
            .max_capacity(DEFAULT_TOKEN_CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { backend, valid_cache }
    }

    /// Issues a new token for `user`.
    ///
    /// The generated value is checked for uniqueness against both the live
    /// token store and the banned set before acceptance. Collisions are
    /// astronomically unlikely, but correctness requires the check, so the
    /// loop stays.
    pub async fn issue(&self, user: UserId, device_os: Option<String>) -> AuthResult<String> {
        loop {
            let candidate = Uuid::new_v4().to_string();
            if self.backend.get(&keys::banned_key(&candidate)).await?.is_some() {
                continue;
            }
            // Insert-if-absent on the index makes the uniqueness check
            // race-free against concurrent issuance of the same value.
            match self
                .backend
                .compare_and_set(keys::token_index_key(&candidate), None, codec::encode(&user)?)
                .await
            {
                Err(StorageError::Conflict) => continue,
                Err(other) => return Err(other.into()),
                Ok(()) => {},
            }

            let record = AccessToken {
                user,
                token: candidate.clone(),
                issued_at: Utc::now(),
                device_os,
            };
            self.backend.set(keys::token_key(user, &candidate), codec::encode(&record)?).await?;
            self.valid_cache.insert((user, candidate.clone()), ()).await;
            tracing::debug!(user = %user, "issued access token");
            return Ok(candidate);
        }
    }

    /// Checks whether `token` is a live token of `user`.
    ///
    /// A cache hit short-circuits the durable store and only ever returns
    /// `true`. On a miss the durable store decides; banned tokens are
    /// rejected explicitly (and logged), not silently.
    pub async fn check_token(&self, user: UserId, token: &str) -> AuthResult<bool> {
        let cache_key = (user, token.to_owned());
        if self.valid_cache.get(&cache_key).await.is_some() {
            return Ok(true);
        }

        if self.backend.get(&keys::token_key(user, token)).await?.is_none() {
            if let Some(bytes) = self.backend.get(&keys::banned_key(token)).await? {
                let banned: BannedToken = codec::decode(&bytes)?;
                tracing::debug!(
                    user = %user,
                    reason = %banned.reason,
                    "rejected banned token replay",
                );
            }
            return Ok(false);
        }

        // Double-check after filling: if a revocation landed between the
        // read and the insert, drop the entry again so the revocation's
        // "no stale valid hits" guarantee holds.
        self.valid_cache.insert(cache_key.clone(), ()).await;
        if self.backend.get(&keys::token_key(user, token)).await?.is_none() {
            self.valid_cache.invalidate(&cache_key).await;
            return Ok(false);
        }
        Ok(true)
    }

    /// Reason a token was banned, if it is in the banned set.
    pub async fn banned_reason(&self, token: &str) -> AuthResult<Option<String>> {
        match self.backend.get(&keys::banned_key(token)).await? {
            Some(bytes) => {
                let banned: BannedToken = codec::decode(&bytes)?;
                Ok(Some(banned.reason))
            },
            None => Ok(None),
        }
    }

    /// Revokes a single token, moving it into the banned set.
    ///
    /// Returns whether a live token was actually revoked. The positive
    /// cache entry is invalidated before this returns.
    pub async fn revoke_one(
        &self,
        user: UserId,
        token: &str,
        reason: Option<&str>,
    ) -> AuthResult<bool> {
        let mut txn = self.backend.transaction().await?;
        let existing = txn.get(&keys::token_key(user, token)).await?;
        if existing.is_none() {
            self.valid_cache.invalidate(&(user, token.to_owned())).await;
            return Ok(false);
        }

        let banned = BannedToken {
            user,
            token: token.to_owned(),
            reason: reason.unwrap_or(DEFAULT_BAN_REASON).to_owned(),
            banned_at: Utc::now(),
        };
        txn.delete(keys::token_key(user, token));
        txn.delete(keys::token_index_key(token));
        txn.set(keys::banned_key(token), codec::encode(&banned)?);
        txn.commit().await?;

        self.valid_cache.invalidate(&(user, token.to_owned())).await;
        tracing::info!(user = %user, "revoked access token");
        Ok(true)
    }

    /// Revokes every live token of `user`, moving each into the banned set.
    ///
    /// Returns the number of tokens revoked. A user with no live tokens
    /// yields zero; that is not an error. All cache entries are invalidated
    /// before this returns.
    pub async fn revoke_all(&self, user: UserId, reason: Option<&str>) -> AuthResult<usize> {
        let reason = reason.unwrap_or(DEFAULT_BAN_REASON);
        let now = Utc::now();

        let mut txn = self.backend.transaction().await?;
        let live = txn.get_prefix(&keys::user_tokens_prefix(user)).await?;
        let mut revoked_tokens = Vec::with_capacity(live.len());
        for kv in &live {
            let record: AccessToken = codec::decode(&kv.value)?;
            let banned = BannedToken {
                user,
                token: record.token.clone(),
                reason: reason.to_owned(),
                banned_at: now,
            };
            txn.delete(keys::token_key(user, &record.token));
            txn.delete(keys::token_index_key(&record.token));
            txn.set(keys::banned_key(&record.token), codec::encode(&banned)?);
            revoked_tokens.push(record.token);
        }
        txn.commit().await?;

        for token in &revoked_tokens {
            self.valid_cache.invalidate(&(user, token.clone())).await;
        }
        if !revoked_tokens.is_empty() {
            tracing::info!(user = %user, count = revoked_tokens.len(), reason, "revoked all tokens");
        }
        Ok(revoked_tokens.len())
    }
}
