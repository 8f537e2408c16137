//! Key encoding for the absence ledger's slice of the key space.
//!
//! Keys are UTF-8 path segments with fixed-width, zero-padded numeric
//! components so that lexicographic order matches numeric order within a
//! prefix. Days use their `YYYY-MM-DD` display form, which is likewise
//! order-preserving.
//!
//! Layout:
//!
//! | Prefix | Value |
//! |--------|-------|
//! | `class/{class}` | [`SchoolClass`](crate::records::SchoolClass) |
//! | `pupil/{pupil}` | [`PupilRecord`](crate::records::PupilRecord) |
//! | `absence/{class}/{day}/{pupil}` | [`AbsenceRecord`](crate::records::AbsenceRecord) |
//! | `marker/{class}/{day}` | [`DummyMarker`](crate::records::DummyMarker) |

use rollbook_storage::{ClassId, PupilId, SchoolDay};

/// Width of zero-padded numeric ID segments.
const ID_WIDTH: usize = 6;

pub(crate) fn class_key(class: ClassId) -> Vec<u8> {
    format!("class/{:0ID_WIDTH$}", class.0).into_bytes()
}

pub(crate) fn class_prefix() -> Vec<u8> {
    b"class/".to_vec()
}

pub(crate) fn pupil_key(pupil: PupilId) -> Vec<u8> {
    format!("pupil/{:0ID_WIDTH$}", pupil.0).into_bytes()
}

pub(crate) fn absence_key(class: ClassId, day: SchoolDay, pupil: PupilId) -> Vec<u8> {
    format!("absence/{:0ID_WIDTH$}/{day}/{:0ID_WIDTH$}", class.0, pupil.0).into_bytes()
}

/// Prefix covering every absence record of one class-day.
pub(crate) fn class_day_prefix(class: ClassId, day: SchoolDay) -> Vec<u8> {
    format!("absence/{:0ID_WIDTH$}/{day}/", class.0).into_bytes()
}

/// Prefix covering every absence record of one class, all days.
pub(crate) fn class_absence_prefix(class: ClassId) -> Vec<u8> {
    format!("absence/{:0ID_WIDTH$}/", class.0).into_bytes()
}

pub(crate) fn marker_key(class: ClassId, day: SchoolDay) -> Vec<u8> {
    format!("marker/{:0ID_WIDTH$}/{day}", class.0).into_bytes()
}
