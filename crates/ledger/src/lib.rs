//! # Rollbook Absence Ledger
//!
//! The absence ledger and reconciliation engine: applies batches of
//! placement jobs, maintains the class-day invariant, and serves absence
//! reads and per-shift statistics.
//!
//! # The class-day invariant
//!
//! For every (class, day) the engine has processed, exactly one of:
//!
//! - at least one [`AbsenceRecord`], or
//! - one [`DummyMarker`] ("checked, nothing to report")
//!
//! exists — never both, never neither. This distinguishes "no data yet"
//! (neither) from "confirmed zero absences" (marker). Reconciliation is
//! idempotent and self-healing: inserting a real record removes a stale
//! marker, removing the last record re-installs one.
//!
//! # Example
//!
//! ```
//! use std::{collections::BTreeSet, sync::Arc};
//! use rollbook_ledger::{
//!     AbsenceReason, NullSink, PlacementJob, ReconciliationEngine, SchoolClass, SchoolRegistry,
//! };
//! use rollbook_storage::{ClassId, MemoryBackend, PupilId, SchoolDay};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = Arc::new(MemoryBackend::new());
//! let registry = SchoolRegistry::new(backend.clone());
//! registry
//!     .register_class(&SchoolClass {
//!         id: ClassId(10),
//!         title: "5A".into(),
//!         second_shift: false,
//!         class_teacher: None,
//!     })
//!     .await?;
//! registry.register_pupil(PupilId(7), ClassId(10)).await?;
//!
//! let engine = ReconciliationEngine::new(backend, Arc::new(NullSink));
//! let day = SchoolDay::from_ymd(2024, 3, 4).unwrap();
//! engine
//!     .apply_batch(&[PlacementJob {
//!         pupil: PupilId(7),
//!         class: ClassId(10),
//!         day,
//!         lessons: BTreeSet::from([1, 2, 3]),
//!         reason: Some(AbsenceReason::Illness),
//!         submitted_by: None,
//!         note: None,
//!     }])
//!     .await?;
//!
//! assert_eq!(engine.class_absence(ClassId(10), day).await?.len(), 1);
//! # Ok::<(), rollbook_ledger::LedgerError>(())
//! # });
//! ```

pub mod engine;
pub mod error;
mod keys;
pub mod records;
pub mod registry;
mod retry;
pub mod sink;

pub use engine::{DayStatistics, ReconciliationEngine};
pub use error::{LedgerError, LedgerResult};
pub use records::{
    AbsenceNote, AbsenceReason, AbsenceRecord, DummyMarker, PlacementJob, PupilRecord, SchoolClass,
};
pub use registry::SchoolRegistry;
pub use retry::RetryConfig;
pub use sink::{NullSink, SinkError, UpstreamSink};
