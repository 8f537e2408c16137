//! Storage error types and result alias.
//!
//! This module defines the error types that can occur during storage
//! operations. All storage backends must map their internal errors to these
//! standardized error types.
//!
//! # Error Types
//!
//! - [`StorageError::NotFound`] - Key does not exist in the storage backend
//! - [`StorageError::Conflict`] - Commit conflict due to concurrent modification
//! - [`StorageError::Connection`] - Network or connection-related failures
//! - [`StorageError::Serialization`] - Data encoding/decoding failures
//! - [`StorageError::Internal`] - Backend-specific internal errors
//! - [`StorageError::Timeout`] - Operation exceeded time limit

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// This enum represents the canonical set of errors that any storage backend
/// can produce. Backend implementations should map their internal error types
/// to these variants.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The requested key was not found in the storage backend.
    #[error("Key not found: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// Commit conflict due to optimistic locking failure.
    ///
    /// This error occurs when a transaction or compare-and-set attempts to
    /// commit but a concurrent writer has modified the same keys. The
    /// operation should typically be retried from a fresh read.
    #[error("Transaction conflict")]
    Conflict,

    /// Connection or network error.
    ///
    /// Indicates a failure to communicate with the storage backend, such as
    /// a network timeout, DNS failure, or connection refused.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Serialization or deserialization error.
    ///
    /// Occurs when data cannot be encoded for storage or decoded when
    /// retrieved. This typically indicates data corruption or schema
    /// incompatibility.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
        /// The underlying error, when available.
        #[source]
        source: Option<BoxError>,
    },

    /// Operation exceeded its time limit.
    #[error("Operation timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before the deadline fired.
        elapsed_ms: u64,
    },

    /// Backend-specific internal error.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a [`StorageError::NotFound`] for the given key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a [`StorageError::Connection`] without a source error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a [`StorageError::Serialization`] from a message and source.
    pub fn serialization(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::Serialization { message: message.into(), source }
    }

    /// Creates a [`StorageError::Internal`] with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether the error is transient and the operation may succeed if
    /// retried against the same backend.
    ///
    /// Conflicts are deliberately *not* transient: retrying a conflicted
    /// commit without re-reading would reproduce the lost update the
    /// conflict detection exists to prevent. Callers retry conflicts at the
    /// boundary where they can re-read (see `rollbook-ledger`).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Errors produced while validating configuration values.
///
/// Shared by every crate in the workspace that exposes a builder-validated
/// configuration struct.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A field was below its allowed minimum.
    #[error("{field} must be at least {min} (got {value})")]
    BelowMinimum {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable minimum.
        min: String,
        /// Human-readable offending value.
        value: String,
    },

    /// A field that must not be empty was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field failed to parse.
    #[error("{field} is invalid: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_not_transient() {
        assert!(!StorageError::Conflict.is_transient());
    }

    #[test]
    fn connection_and_timeout_are_transient() {
        assert!(StorageError::connection("refused").is_transient());
        assert!(StorageError::Timeout { elapsed_ms: 30_000 }.is_transient());
    }

    #[test]
    fn not_found_displays_key() {
        let err = StorageError::not_found("absence/0010/2024-03-04/0007");
        assert_eq!(err.to_string(), "Key not found: absence/0010/2024-03-04/0007");
    }
}
