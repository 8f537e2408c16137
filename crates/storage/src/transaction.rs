//! Transaction trait for atomic storage operations.
//!
//! This module defines the [`Transaction`] trait that enables atomic
//! multi-operation commits to storage backends.
//!
//! # Transaction Semantics
//!
//! Transactions provide:
//! - **Atomicity**: All operations in a transaction either succeed together or fail together
//! - **Read-your-writes**: Reads within a transaction see pending writes
//! - **Buffering**: Writes are buffered until commit
//!
//! # Example
//!
//! ```
//! use rollbook_storage::{MemoryBackend, StorageBackend, Transaction as _};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//!
//! backend.set(b"marker/10/2024-03-04".to_vec(), b"dummy".to_vec()).await.unwrap();
//!
//! // Atomically replace a marker with a record
//! let mut txn = backend.transaction().await.unwrap();
//! txn.delete(b"marker/10/2024-03-04".to_vec());
//! txn.set(b"absence/10/2024-03-04/7".to_vec(), b"{}".to_vec());
//! txn.commit().await.unwrap();
//! # });
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;

/// Transaction handle for atomic multi-operation commits.
///
/// A transaction buffers operations (sets and deletes) until
/// [`commit`](Transaction::commit) is called, at which point all operations
/// are applied atomically.
///
/// # Concurrency
///
/// Transactions implement optimistic concurrency control. Every key *read*
/// through the transaction is tracked; if a concurrent commit modifies any
/// tracked or written key before this transaction commits, the commit fails
/// with [`StorageError::Conflict`](crate::StorageError::Conflict). This
/// read-set validation is what makes read-then-conditionally-write repair
/// steps safe (see the class-day invariant in `rollbook-ledger`).
///
/// Dropping a transaction without committing abandons all buffered
/// operations; nothing is written.
#[async_trait]
pub trait Transaction: Send {
    /// Gets a value within the transaction.
    ///
    /// Checks pending writes first (read-your-writes), then falls back to
    /// the underlying storage. The observed version is recorded for commit
    /// validation.
    async fn get(&mut self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Lists key-value pairs whose keys start with `prefix`, in key order.
    ///
    /// Pending writes in this transaction are merged over the stored state.
    /// All returned keys join the read set.
    async fn get_prefix(&mut self, prefix: &[u8]) -> StorageResult<Vec<crate::KeyValue>>;

    /// Buffers a set operation within the transaction.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Buffers a delete operation within the transaction.
    fn delete(&mut self, key: Vec<u8>);

    /// Atomically applies all buffered operations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`](crate::StorageError::Conflict) if
    /// any key read or written by this transaction was modified by another
    /// commit since it was first observed. The caller should re-read and
    /// retry.
    async fn commit(self: Box<Self>) -> StorageResult<()>;
}
