//! Role model and the pure role computation.
//!
//! [`compute_roles`] is deliberately a pure function of its inputs — the
//! caller supplies "now", the persisted grants, class relationships and
//! today's timetable — so every branch is unit-testable without a cache or
//! a store. The cached, store-backed entry point is
//! [`RoleService`](crate::service::RoleService).

use std::time::Duration;

use chrono::NaiveTime;
use rollbook_storage::{ClassId, UserId};
use serde::{Deserialize, Serialize};

/// Broad account categories, as carried by the request layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    /// A pupil account.
    Pupil,
    /// A parent account (no class-scoped roles of its own).
    Parent,
    /// A teacher account.
    Teacher,
    /// A school administration account.
    Administration,
}

/// Class-scoped role kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Owns the class: full read/write over its attendance.
    ClassTeacher,
    /// Explicitly delegated data-entry rights for a class.
    DataDelegate,
    /// Teaching the class right now; expires at the end of the lesson.
    LessonTeacher,
    /// Member of the class.
    Pupil,
}

impl RoleKind {
    /// Stable lowercase tag used inside storage keys.
    #[must_use]
    pub fn storage_tag(&self) -> &'static str {
        match self {
            Self::ClassTeacher => "class_teacher",
            Self::DataDelegate => "data_delegate",
            Self::LessonTeacher => "lesson_teacher",
            Self::Pupil => "pupil",
        }
    }
}

/// A persisted, explicitly granted role.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Granted role kind.
    pub kind: RoleKind,
    /// Class the grant is scoped to.
    pub class: ClassId,
}

/// A computed role: grant-derived or implicit, possibly time-bounded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Role kind.
    pub kind: RoleKind,
    /// Class the role is scoped to.
    pub class: ClassId,
    /// Time until the role naturally expires (lesson-teacher roles only).
    pub expire_in: Option<Duration>,
}

/// One slot of a teacher's timetable for the current day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSlot {
    /// Position of the lesson in the day (1-based).
    pub place: u8,
    /// Class being taught.
    pub class: ClassId,
    /// Lesson start (inclusive).
    pub starts: NaiveTime,
    /// Lesson end (exclusive).
    pub ends: NaiveTime,
}

impl LessonSlot {
    fn contains(&self, now: NaiveTime) -> bool {
        self.starts <= now && now < self.ends
    }
}

/// Computes the full role list for a user at a given wall-clock time.
///
/// Combines:
///
/// 1. persisted `grants`, verbatim, with no expiry;
/// 2. an implicit [`RoleKind::Pupil`] role from `pupil_class` when the user is a pupil;
/// 3. for teachers and administration: an implicit [`RoleKind::ClassTeacher`] role over
///    `own_class`, and a [`RoleKind::LessonTeacher`] role for the lesson whose interval contains
///    `now` (`start <= now < end`), expiring when that lesson ends.
///
/// When several of today's lessons overlap `now`, the first match in
/// timetable order wins. Overlaps should not occur in a well-formed
/// timetable; the tie-break is deliberate and pinned by a test so a
/// refactor cannot silently change which class wins.
#[must_use]
pub fn compute_roles(
    user_kind: UserKind,
    now: NaiveTime,
    grants: &[RoleGrant],
    pupil_class: Option<ClassId>,
    own_class: Option<ClassId>,
    todays_lessons: &[LessonSlot],
) -> Vec<RoleAssignment> {
    let mut roles: Vec<RoleAssignment> = grants
        .iter()
        .map(|g| RoleAssignment { kind: g.kind, class: g.class, expire_in: None })
        .collect();

    if user_kind == UserKind::Pupil
        && let Some(class) = pupil_class
    {
        roles.push(RoleAssignment { kind: RoleKind::Pupil, class, expire_in: None });
    }

    if matches!(user_kind, UserKind::Teacher | UserKind::Administration) {
        if let Some(class) = own_class {
            roles.push(RoleAssignment { kind: RoleKind::ClassTeacher, class, expire_in: None });
        }
        if let Some(lesson) = todays_lessons.iter().find(|l| l.contains(now)) {
            let remaining = (lesson.ends - now).to_std().unwrap_or(Duration::ZERO);
            roles.push(RoleAssignment {
                kind: RoleKind::LessonTeacher,
                class: lesson.class,
                expire_in: Some(remaining),
            });
        }
    }

    roles
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn lesson(place: u8, class: i64, start: (u32, u32), end: (u32, u32)) -> LessonSlot {
        LessonSlot {
            place,
            class: ClassId(class),
            starts: t(start.0, start.1),
            ends: t(end.0, end.1),
        }
    }

    #[test]
    fn pupil_gets_implicit_membership_role() {
        let roles =
            compute_roles(UserKind::Pupil, t(10, 0), &[], Some(ClassId(10)), None, &[]);
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].kind, RoleKind::Pupil);
        assert_eq!(roles[0].class, ClassId(10));
        assert_eq!(roles[0].expire_in, None);
    }

    #[test]
    fn teacher_in_lesson_gets_bounded_role() {
        let lessons = [lesson(1, 10, (9, 0), (9, 45)), lesson(2, 11, (10, 0), (10, 45))];
        let roles =
            compute_roles(UserKind::Teacher, t(10, 30), &[], None, Some(ClassId(12)), &lessons);

        let class_teacher =
            roles.iter().find(|r| r.kind == RoleKind::ClassTeacher).expect("class teacher");
        assert_eq!(class_teacher.class, ClassId(12));

        let lesson_teacher =
            roles.iter().find(|r| r.kind == RoleKind::LessonTeacher).expect("lesson teacher");
        assert_eq!(lesson_teacher.class, ClassId(11));
        assert_eq!(lesson_teacher.expire_in, Some(Duration::from_secs(15 * 60)));
    }

    #[test]
    fn teacher_between_lessons_gets_no_lesson_role() {
        let lessons = [lesson(1, 10, (9, 0), (9, 45))];
        let roles = compute_roles(UserKind::Teacher, t(9, 50), &[], None, None, &lessons);
        assert!(roles.iter().all(|r| r.kind != RoleKind::LessonTeacher));
    }

    /// Lesson start is inclusive, lesson end exclusive.
    #[test]
    fn interval_boundaries() {
        let lessons = [lesson(1, 10, (9, 0), (9, 45))];
        let at_start = compute_roles(UserKind::Teacher, t(9, 0), &[], None, None, &lessons);
        assert!(at_start.iter().any(|r| r.kind == RoleKind::LessonTeacher));

        let at_end = compute_roles(UserKind::Teacher, t(9, 45), &[], None, None, &lessons);
        assert!(at_end.iter().all(|r| r.kind != RoleKind::LessonTeacher));
    }

    /// When timetable entries overlap, the first match in timetable order
    /// wins — every time. Pins the tie-break so a refactor can't silently
    /// change which class the role targets.
    #[test]
    fn overlapping_lessons_first_match_wins() {
        let lessons = [lesson(1, 10, (9, 0), (10, 0)), lesson(2, 11, (9, 30), (10, 30))];
        for _ in 0..10 {
            let roles = compute_roles(UserKind::Teacher, t(9, 45), &[], None, None, &lessons);
            let lesson_roles: Vec<_> =
                roles.iter().filter(|r| r.kind == RoleKind::LessonTeacher).collect();
            assert_eq!(lesson_roles.len(), 1);
            assert_eq!(lesson_roles[0].class, ClassId(10));
        }
    }

    #[test]
    fn grants_carry_through_for_any_user_kind() {
        let grants = [RoleGrant { kind: RoleKind::DataDelegate, class: ClassId(10) }];
        let roles = compute_roles(UserKind::Parent, t(12, 0), &grants, None, None, &[]);
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].kind, RoleKind::DataDelegate);
    }

    /// Parents and pupils never receive teacher-derived roles, even with a
    /// timetable present.
    #[test]
    fn non_teachers_skip_timetable() {
        let lessons = [lesson(1, 10, (9, 0), (10, 0))];
        let roles = compute_roles(UserKind::Pupil, t(9, 30), &[], Some(ClassId(10)), None, &lessons);
        assert!(roles.iter().all(|r| r.kind != RoleKind::LessonTeacher));
    }
}
