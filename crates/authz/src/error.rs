//! Authorization error types.

use thiserror::Error;

/// Result type alias for authorization operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors produced by the token service and role computation.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] rollbook_storage::StorageError),
}
