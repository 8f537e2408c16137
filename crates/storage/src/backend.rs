//! Storage backend trait definition.
//!
//! This module defines the [`StorageBackend`] trait, which is the core
//! abstraction for key-value storage in Rollbook. All storage implementations
//! implement this trait.
//!
//! # Design Philosophy
//!
//! The trait provides a minimal, generic key-value interface:
//! - **Keys and values are bytes**: No assumptions about serialization format
//! - **Async by default**: All operations are async for non-blocking I/O
//! - **Prefix scans supported**: Ordered per-class-day and per-user listings
//! - **Transactional**: Atomic multi-key operations via transactions
//!
//! Domain-specific logic (absence records, tokens, credentials) lives in the
//! repository layers built on top of this trait, not in the storage backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::StorageResult, transaction::Transaction, types::KeyValue};

/// Abstract storage backend for key-value operations.
///
/// Backends are expected to be thread-safe (`Send + Sync`) and support
/// concurrent operations.
///
/// # Key Operations
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](StorageBackend::get) | Retrieve a single value by key |
/// | [`set`](StorageBackend::set) | Store a key-value pair |
/// | [`compare_and_set`](StorageBackend::compare_and_set) | Atomic compare-and-swap |
/// | [`delete`](StorageBackend::delete) | Remove a key |
/// | [`get_prefix`](StorageBackend::get_prefix) | Ordered scan of a key prefix |
/// | [`transaction`](StorageBackend::transaction) | Begin an atomic transaction |
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use rollbook_storage::{MemoryBackend, StorageBackend};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = MemoryBackend::new();
///
/// backend.set(b"token/42/abc".to_vec(), b"{}".to_vec()).await.unwrap();
/// let value = backend.get(b"token/42/abc").await.unwrap();
/// assert_eq!(value, Some(Bytes::from("{}")));
/// # });
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the key exists
    /// - `Ok(None)` if the key doesn't exist
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair, overwriting any existing value.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Atomically sets a key's value if it matches the expected current value.
    ///
    /// # Semantics
    ///
    /// - **`expected: None`** — insert-if-absent. Succeeds only when the key does not exist. Fails
    ///   with [`Conflict`](crate::StorageError::Conflict) if any value is present.
    /// - **`expected: Some(value)`** — update-if-unchanged. Succeeds only when the current value is
    ///   an exact byte-for-byte match. Fails with [`Conflict`](crate::StorageError::Conflict) if
    ///   the key is absent or holds a different value.
    ///
    /// The comparison is exact byte equality; callers serializing structured
    /// data must ensure the encoding is deterministic (struct fields rather
    /// than hash maps).
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn compare_and_set(
        &self,
        key: Vec<u8>,
        expected: Option<Vec<u8>>,
        new_value: Vec<u8>,
    ) -> StorageResult<()>;

    /// Removes a key. Deleting a missing key is not an error.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Lists key-value pairs whose keys start with `prefix`, in key order.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>>;

    /// Begins an atomic transaction.
    ///
    /// See [`Transaction`] for buffering, read-your-writes and conflict
    /// semantics.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>>;
}
