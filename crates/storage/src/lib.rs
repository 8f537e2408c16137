//! Shared storage backend abstraction for Rollbook services.
//!
//! This crate provides the [`StorageBackend`] trait and related types that
//! form the foundation for all durable state in Rollbook: absence records,
//! class-day markers, access tokens, upstream credentials and role grants.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Domain Layer                               │
//! │  ReconciliationEngine │ TokenService │ CredentialSweeper    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  Repository Layer                           │
//! │  AbsenceStore │ TokenStore │ CredentialStore │ etc.         │
//! │        (serialization, key encoding, indexing)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  rollbook-storage                           │
//! │               StorageBackend trait                          │
//! │     (get, set, delete, get_prefix, CAS, transaction)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  MemoryBackend                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use rollbook_storage::{MemoryBackend, StorageBackend, Transaction as _};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//!
//! backend.set(b"class/0010".to_vec(), b"{\"title\":\"5A\"}".to_vec()).await?;
//! let value = backend.get(b"class/0010").await?;
//! assert!(value.is_some());
//!
//! // Atomic multi-key operations
//! let mut txn = backend.transaction().await?;
//! txn.set(b"absence/0010/2024-03-04/0007".to_vec(), b"{}".to_vec());
//! txn.delete(b"marker/0010/2024-03-04".to_vec());
//! txn.commit().await?;
//! # Ok::<(), rollbook_storage::StorageError>(())
//! # });
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`], which wraps potential
//! [`StorageError`] variants. Backends should map their internal errors
//! to these standardized error types.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with shared test helpers. Enable this in
//!   `[dev-dependencies]` for integration tests.

pub mod backend;
pub mod codec;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod transaction;
pub mod types;

// Re-export primary types at crate root for convenience
pub use backend::StorageBackend;
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use transaction::Transaction;
pub use types::{ClassId, KeyValue, PupilId, SchoolDay, UserId};
