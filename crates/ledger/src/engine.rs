//! The reconciliation engine.
//!
//! [`ReconciliationEngine::apply_batch`] is the only writer of absence
//! records and dummy markers. Every batch is applied in a single storage
//! transaction, and every mutation is followed by a repair step that
//! restores the class-day invariant:
//!
//! > for every (class, day) the engine has processed, exactly one of
//! > {at least one absence record, one dummy marker} exists — never both,
//! > never neither.
//!
//! The repair step is a read-then-conditionally-write; the storage layer's
//! read-set validation (including prefix-set validation) makes it safe
//! under concurrent batches for the same class-day: the loser's commit
//! conflicts and is retried from a fresh read.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use rollbook_storage::{ClassId, SchoolDay, StorageBackend, Transaction, codec};

use crate::{
    error::{LedgerError, LedgerResult},
    keys,
    records::{AbsenceReason, AbsenceRecord, DummyMarker, PlacementJob, PupilRecord},
    retry::RetryConfig,
    sink::UpstreamSink,
};

/// Per-shift reason counts for one school day.
///
/// Every [`AbsenceReason`] variant is present in both maps, zero-defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStatistics {
    /// Counts for first-shift (morning) classes.
    pub first_shift: BTreeMap<AbsenceReason, usize>,
    /// Counts for second-shift (afternoon) classes.
    pub second_shift: BTreeMap<AbsenceReason, usize>,
}

fn zero_counts() -> BTreeMap<AbsenceReason, usize> {
    AbsenceReason::ALL.iter().map(|r| (*r, 0)).collect()
}

/// Applies placement batches and serves absence reads.
///
/// Constructed once at process start with an injected backend and upstream
/// sink; cheaply cloneable.
#[derive(Clone)]
pub struct ReconciliationEngine {
    backend: Arc<dyn StorageBackend>,
    sink: Arc<dyn UpstreamSink>,
    retry: RetryConfig,
}

impl ReconciliationEngine {
    /// Creates an engine over the given backend and upstream sink.
    pub fn new(backend: Arc<dyn StorageBackend>, sink: Arc<dyn UpstreamSink>) -> Self {
        Self { backend, sink, retry: RetryConfig::default() }
    }

    /// Replaces the commit retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Applies a batch of placement jobs atomically.
    ///
    /// Each upsert job replaces the record keyed by (pupil, day); each clear
    /// job (`reason: None` or empty lessons) deletes it. After every
    /// mutation the class-day invariant is re-checked and repaired. The
    /// whole batch commits or none of it does; validation failures reject
    /// the batch before anything is written.
    ///
    /// After a successful local commit the batch is offered to the upstream
    /// sink; sink failures are logged and never affect the result.
    ///
    /// # Errors
    ///
    /// Validation errors ([`LedgerError::EmptyBatch`],
    /// [`LedgerError::MixedClasses`], [`LedgerError::NonSchoolDay`],
    /// [`LedgerError::UnknownClass`], [`LedgerError::UnknownPupil`],
    /// [`LedgerError::PupilNotInClass`]) reject the batch synchronously.
    /// Commit conflicts are retried with backoff before surfacing as
    /// [`LedgerError::Storage`].
    #[tracing::instrument(skip(self, jobs), fields(jobs = jobs.len()))]
    pub async fn apply_batch(&self, jobs: &[PlacementJob]) -> LedgerResult<()> {
        let class = validate_shape(jobs)?;

        let mut attempt = 0_u32;
        loop {
            match self.try_apply(class, jobs).await {
                Ok(()) => break,
                Err(err) if RetryConfig::should_retry(&err) && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    attempt += 1;
                    tracing::debug!(
                        class = %class,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "batch commit contended, retrying after backoff",
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(err) => return Err(err),
            }
        }

        // Push failure must never roll back or block the local commit.
        if let Err(err) = self.sink.push(jobs).await {
            tracing::warn!(class = %class, error = %err, "upstream push failed after local commit");
        }
        Ok(())
    }

    /// One transactional attempt at applying the batch.
    async fn try_apply(&self, class: ClassId, jobs: &[PlacementJob]) -> LedgerResult<()> {
        let mut txn = self.backend.transaction().await?;

        if txn.get(&keys::class_key(class)).await?.is_none() {
            return Err(LedgerError::UnknownClass(class));
        }
        for job in jobs {
            let bytes = txn
                .get(&keys::pupil_key(job.pupil))
                .await?
                .ok_or(LedgerError::UnknownPupil(job.pupil))?;
            let pupil: PupilRecord = codec::decode(&bytes)?;
            if pupil.class != class {
                return Err(LedgerError::PupilNotInClass {
                    pupil: job.pupil,
                    class,
                    actual: pupil.class,
                });
            }
        }

        let days: BTreeSet<SchoolDay> = jobs.iter().map(|j| j.day).collect();
        for day in &days {
            detect_violation(txn.as_mut(), class, *day).await?;
        }

        let now = Utc::now();
        for job in jobs {
            let key = keys::absence_key(class, job.day, job.pupil);
            if job.is_upsert() {
                let record = AbsenceRecord {
                    pupil: job.pupil,
                    class,
                    day: job.day,
                    reason: job.reason.unwrap_or(AbsenceReason::Unknown),
                    lessons: job.lessons.clone(),
                    submitted_by: job.submitted_by,
                    note: job.note.clone(),
                    last_changed: now,
                };
                txn.set(key, codec::encode(&record)?);
            } else {
                txn.delete(key);
            }
            repair_class_day(txn.as_mut(), class, job.day, now).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Explicitly reconciles a class-day with nothing to report.
    ///
    /// Installs a dummy marker if — and only if — the class-day has no
    /// absence records and no marker yet. Returns whether a marker was
    /// installed.
    pub async fn mark_empty_day(&self, class: ClassId, day: SchoolDay) -> LedgerResult<bool> {
        if day.is_sunday() {
            return Err(LedgerError::NonSchoolDay(day));
        }

        let mut attempt = 0_u32;
        loop {
            let result = self.try_mark_empty(class, day).await;
            match result {
                Err(err) if RetryConfig::should_retry(&err) && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                },
                other => return other,
            }
        }
    }

    async fn try_mark_empty(&self, class: ClassId, day: SchoolDay) -> LedgerResult<bool> {
        let mut txn = self.backend.transaction().await?;
        if txn.get(&keys::class_key(class)).await?.is_none() {
            return Err(LedgerError::UnknownClass(class));
        }

        let has_records = !txn.get_prefix(&keys::class_day_prefix(class, day)).await?.is_empty();
        let has_marker = txn.get(&keys::marker_key(class, day)).await?.is_some();
        if has_records || has_marker {
            return Ok(false);
        }
        let marker = DummyMarker { class, day, placed_at: Utc::now() };
        txn.set(keys::marker_key(class, day), codec::encode(&marker)?);
        txn.commit().await?;
        Ok(true)
    }

    /// Absence records for one class-day. Dummy markers are not records and
    /// never appear here.
    pub async fn class_absence(
        &self,
        class: ClassId,
        day: SchoolDay,
    ) -> LedgerResult<Vec<AbsenceRecord>> {
        self.ensure_class(class).await?;
        let mut out = Vec::new();
        for kv in self.backend.get_prefix(&keys::class_day_prefix(class, day)).await? {
            out.push(codec::decode(&kv.value)?);
        }
        Ok(out)
    }

    /// Absence records for one class across an inclusive day range.
    pub async fn class_absence_range(
        &self,
        class: ClassId,
        from: SchoolDay,
        to: SchoolDay,
    ) -> LedgerResult<Vec<AbsenceRecord>> {
        self.ensure_class(class).await?;
        let mut out = Vec::new();
        for kv in self.backend.get_prefix(&keys::class_absence_prefix(class)).await? {
            let record: AbsenceRecord = codec::decode(&kv.value)?;
            if record.day >= from && record.day <= to {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Per-shift reason counts for one day, zero-defaulted over every
    /// reason kind.
    pub async fn statistics(&self, day: SchoolDay) -> LedgerResult<DayStatistics> {
        let mut stats =
            DayStatistics { first_shift: zero_counts(), second_shift: zero_counts() };

        for class_kv in self.backend.get_prefix(&keys::class_prefix()).await? {
            let class: crate::records::SchoolClass = codec::decode(&class_kv.value)?;
            let shift =
                if class.second_shift { &mut stats.second_shift } else { &mut stats.first_shift };
            for record_kv in self.backend.get_prefix(&keys::class_day_prefix(class.id, day)).await? {
                let record: AbsenceRecord = codec::decode(&record_kv.value)?;
                *shift.entry(record.reason).or_insert(0) += 1;
            }
        }
        Ok(stats)
    }

    /// Classes with neither an absence record nor a dummy marker for `day`
    /// — not yet reconciled at all, as opposed to "reconciled, nothing to
    /// report".
    pub async fn classes_with_no_data(&self, day: SchoolDay) -> LedgerResult<Vec<ClassId>> {
        let mut out = Vec::new();
        for kv in self.backend.get_prefix(&keys::class_prefix()).await? {
            let class: crate::records::SchoolClass = codec::decode(&kv.value)?;
            let has_records =
                !self.backend.get_prefix(&keys::class_day_prefix(class.id, day)).await?.is_empty();
            if has_records {
                continue;
            }
            let has_marker = self.backend.get(&keys::marker_key(class.id, day)).await?.is_some();
            if !has_marker {
                out.push(class.id);
            }
        }
        Ok(out)
    }

    async fn ensure_class(&self, class: ClassId) -> LedgerResult<()> {
        if self.backend.get(&keys::class_key(class)).await?.is_none() {
            return Err(LedgerError::UnknownClass(class));
        }
        Ok(())
    }
}

/// Validates batch shape: non-empty, single class, school days only.
fn validate_shape(jobs: &[PlacementJob]) -> LedgerResult<ClassId> {
    let first = jobs.first().ok_or(LedgerError::EmptyBatch)?;
    for job in jobs {
        if job.class != first.class {
            return Err(LedgerError::MixedClasses { expected: first.class, found: job.class });
        }
        if job.day.is_sunday() {
            return Err(LedgerError::NonSchoolDay(job.day));
        }
    }
    Ok(first.class)
}

/// Logs (at error severity) a stored state that violates the class-day
/// invariant. The repair step that follows heals it; the log is the signal
/// that some earlier writer misbehaved.
async fn detect_violation(
    txn: &mut dyn Transaction,
    class: ClassId,
    day: SchoolDay,
) -> LedgerResult<()> {
    let has_records = !txn.get_prefix(&keys::class_day_prefix(class, day)).await?.is_empty();
    let has_marker = txn.get(&keys::marker_key(class, day)).await?.is_some();
    if has_records && has_marker {
        tracing::error!(
            class = %class,
            day = %day,
            "class-day has both live records and a dummy marker; repairing",
        );
    }
    Ok(())
}

/// Restores the class-day invariant over the transaction's merged view:
/// a dummy marker exists exactly when no records do. Idempotent; safe to
/// run after every mutation.
async fn repair_class_day(
    txn: &mut dyn Transaction,
    class: ClassId,
    day: SchoolDay,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    let has_records = !txn.get_prefix(&keys::class_day_prefix(class, day)).await?.is_empty();
    let marker_key = keys::marker_key(class, day);
    let has_marker = txn.get(&marker_key).await?.is_some();

    if has_records {
        if has_marker {
            txn.delete(marker_key);
        }
    } else if !has_marker {
        let marker = DummyMarker { class, day, placed_at: now };
        txn.set(marker_key, codec::encode(&marker)?);
    }
    Ok(())
}
