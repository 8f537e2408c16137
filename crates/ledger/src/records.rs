//! Persisted record shapes for the absence ledger.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rollbook_storage::{ClassId, PupilId, SchoolDay, UserId};
use serde::{Deserialize, Serialize};

/// Why a pupil was absent.
///
/// Statistics always report every variant, zero-defaulted, so the wire set
/// is closed; `Unknown` doubles as the decode fallback for retired values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceReason {
    /// Sick at home.
    Illness,
    /// Medical appointment or treatment.
    Healing,
    /// Absence requested by the family.
    Request,
    /// Excused by the principal's decision.
    PrincipalDecision,
    /// No reason supplied.
    Unknown,
}

impl AbsenceReason {
    /// All reasons, in reporting order.
    pub const ALL: [Self; 5] =
        [Self::Illness, Self::Healing, Self::Request, Self::PrincipalDecision, Self::Unknown];
}

/// Free-form or structured annotation attached to an absence record.
///
/// Stored as a tagged union so the two shapes stay distinguishable at the
/// storage boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AbsenceNote {
    /// Plain text left by the submitter.
    Text(String),
    /// Structured payload attached by an integration.
    Data(serde_json::Value),
}

/// One pupil's absence on one school day.
///
/// Uniquely identified by (pupil, day). Mutated only by the
/// [`ReconciliationEngine`](crate::ReconciliationEngine); deleted when
/// `lessons` becomes empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    /// The absent pupil.
    pub pupil: PupilId,
    /// The pupil's class at the time of recording.
    pub class: ClassId,
    /// The school day this record covers.
    pub day: SchoolDay,
    /// Reason for the absence.
    pub reason: AbsenceReason,
    /// Skipped lesson slots (small positive indices, deduplicated, ordered).
    pub lessons: BTreeSet<u8>,
    /// Who submitted the record, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<UserId>,
    /// Optional annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<AbsenceNote>,
    /// Last mutation timestamp.
    pub last_changed: DateTime<Utc>,
}

/// Explicit "checked, nothing to report" marker for one class-day.
///
/// Exactly one of {≥1 [`AbsenceRecord`], one `DummyMarker`} exists for every
/// reconciled class-day; the engine's repair step maintains that invariant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyMarker {
    /// The class this marker covers.
    pub class: ClassId,
    /// The day this marker covers.
    pub day: SchoolDay,
    /// When the marker was installed.
    pub placed_at: DateTime<Utc>,
}

/// One unit of work for [`ReconciliationEngine::apply_batch`](crate::ReconciliationEngine::apply_batch).
///
/// `reason: None` is the explicit "nothing to report" signal: any existing
/// record for (pupil, day) is removed. All jobs in a batch must share one
/// class; the caller has already resolved pupils to that class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementJob {
    /// Targeted pupil.
    pub pupil: PupilId,
    /// Class the batch covers.
    pub class: ClassId,
    /// Targeted school day.
    pub day: SchoolDay,
    /// Skipped lesson slots; empty together with `reason: None` clears.
    #[serde(default)]
    pub lessons: BTreeSet<u8>,
    /// Reason, or `None` to clear the pupil's record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<AbsenceReason>,
    /// Submitting actor, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<UserId>,
    /// Optional annotation to carry onto the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<AbsenceNote>,
}

impl PlacementJob {
    /// Whether this job upserts a record (as opposed to clearing one).
    #[must_use]
    pub fn is_upsert(&self) -> bool {
        self.reason.is_some() && !self.lessons.is_empty()
    }
}

/// A registered school class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    /// Class identifier.
    pub id: ClassId,
    /// Human-readable title, e.g. `"5A"`.
    pub title: String,
    /// Whether the class studies in the second (afternoon) shift.
    pub second_shift: bool,
    /// The class teacher, when assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_teacher: Option<UserId>,
}

/// Roster entry mapping a pupil to their class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PupilRecord {
    /// Pupil identifier.
    pub id: PupilId,
    /// The class this pupil is enrolled in.
    pub class: ClassId,
}
