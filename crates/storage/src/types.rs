//! Common types used across storage operations and the domain crates.

use bytes::Bytes;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Key-value pair returned from prefix scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The key identifying this entry.
    pub key: Bytes,

    /// The value stored at this key.
    pub value: Bytes,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Macro to define a newtype wrapper around `i64` with standard trait
/// implementations.
///
/// Each generated type:
/// - Is a transparent wrapper around `i64` (zero runtime cost)
/// - Derives `Copy`, `Clone`, `Debug`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Derives `Serialize` and `Deserialize` (transparent)
/// - Implements `From<i64>` and `Into<i64>`
/// - Implements `Display` that outputs the inner value
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// School class identifier.
    ///
    /// The class is the unit of attendance reconciliation: every absence
    /// record and every class-day marker is scoped to a `ClassId`. Wrapping
    /// the raw `i64` prevents passing a `PupilId` where a class is expected.
    ClassId
);

define_id!(
    /// Pupil identifier.
    ///
    /// Pupils are users, but absence records reference them through this
    /// dedicated type so roster lookups cannot be confused with generic
    /// user operations.
    PupilId
);

define_id!(
    /// Generic user identifier (pupils, teachers, administration).
    ///
    /// Tokens, credentials and role grants are keyed by `UserId`.
    UserId
);

impl From<PupilId> for UserId {
    fn from(id: PupilId) -> Self {
        Self(id.0)
    }
}

/// A calendar day in the school's local timezone.
///
/// Attendance is reconciled at day granularity: a `SchoolDay` together with
/// a [`ClassId`] identifies one class-day. The `Display` form (`YYYY-MM-DD`)
/// is also the storage-key form, so lexicographic ordering of encoded days
/// matches chronological ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolDay(pub NaiveDate);

impl SchoolDay {
    /// Creates a school day from year/month/day, if the date is valid.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Whether this day is a Sunday.
    ///
    /// Sundays are never school days; batches targeting one are rejected
    /// before anything is written.
    #[must_use]
    pub fn is_sunday(&self) -> bool {
        self.0.weekday() == Weekday::Sun
    }
}

impl From<NaiveDate> for SchoolDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl std::fmt::Display for SchoolDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for SchoolDay {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_i64() {
        let class = ClassId::from(10);
        assert_eq!(i64::from(class), 10);
        assert_eq!(class.to_string(), "10");
    }

    #[test]
    fn school_day_display_is_sortable() {
        let a = SchoolDay::from_ymd(2024, 3, 4).expect("valid date");
        let b = SchoolDay::from_ymd(2024, 3, 5).expect("valid date");
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn school_day_parses_its_own_display() {
        let day = SchoolDay::from_ymd(2024, 3, 4).expect("valid date");
        let parsed: SchoolDay = day.to_string().parse().expect("parse");
        assert_eq!(parsed, day);
    }

    #[test]
    fn sunday_detection() {
        // 2024-03-03 was a Sunday, 2024-03-04 a Monday.
        assert!(SchoolDay::from_ymd(2024, 3, 3).expect("valid date").is_sunday());
        assert!(!SchoolDay::from_ymd(2024, 3, 4).expect("valid date").is_sunday());
    }

    #[test]
    fn school_day_serializes_as_plain_date() {
        let day = SchoolDay::from_ymd(2024, 3, 4).expect("valid date");
        let json = serde_json::to_string(&day).expect("serialize");
        assert_eq!(json, "\"2024-03-04\"");
    }
}
