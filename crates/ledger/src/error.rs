//! Ledger error types.

use rollbook_storage::{ClassId, PupilId, SchoolDay, StorageError};
use thiserror::Error;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors produced by the reconciliation engine and the school registry.
///
/// Validation errors reject the whole batch synchronously; nothing is
/// written. Storage errors other than commit conflicts abort the batch
/// (conflicts are retried internally before surfacing).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// A batch with no jobs was submitted.
    #[error("Placement batch is empty")]
    EmptyBatch,

    /// Jobs in one batch targeted more than one class.
    #[error("Placement batch mixes classes: expected {expected}, found {found}")]
    MixedClasses {
        /// Class of the first job in the batch.
        expected: ClassId,
        /// The differing class encountered.
        found: ClassId,
    },

    /// The targeted class is not registered.
    #[error("Class with ID {0} does not exist")]
    UnknownClass(ClassId),

    /// The targeted pupil is not registered.
    #[error("Pupil with ID {0} does not exist")]
    UnknownPupil(PupilId),

    /// The pupil exists but belongs to a different class.
    #[error("Pupil {pupil} belongs to class {actual}, not {class}")]
    PupilNotInClass {
        /// Pupil from the offending job.
        pupil: PupilId,
        /// Class the batch targets.
        class: ClassId,
        /// Class the pupil is actually enrolled in.
        actual: ClassId,
    },

    /// The targeted date is not a school day.
    #[error("{0} is not a school day")]
    NonSchoolDay(SchoolDay),

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// Whether the error is a caller mistake (batch rejected, nothing
    /// written) as opposed to an infrastructure failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
