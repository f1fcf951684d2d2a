//! Job persistence and the conditional state transitions.
//!
//! One `JobStore` trait, one backing implementation. Durable backends are the
//! surrounding application's concern; this trait is the seam they implement.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use promokit_core::JobId;

use crate::model::{JobKind, JobOutcome, JobRecord, JobStatus, NewJobRecord};

/// Job store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// A transition was attempted from the wrong state. Logged and rejected,
    /// never silently retried.
    #[error("stale transition for job {id}: expected {expected}, found {actual}")]
    StaleTransition {
        id: JobId,
        expected: JobStatus,
        actual: JobStatus,
    },
}

/// Counts per status, for the administrative surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct JobStats {
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Persistent queue abstraction shared by both job kinds.
///
/// `claim` is the mutual-exclusion primitive: a single conditional update
/// that succeeds for exactly one of any number of concurrent callers.
pub trait JobStore: Send + Sync {
    /// Create a queued record. Validation happens before a record is created,
    /// so enqueue itself is infallible.
    fn enqueue(&self, request: NewJobRecord, now: DateTime<Utc>) -> JobRecord;

    fn get(&self, id: JobId) -> Option<JobRecord>;

    /// The single queued job of this kind with `scheduled_for <= now`,
    /// ordered by priority descending, then `queued_at` ascending, then id
    /// (stable FIFO tie-break). `None` when nothing is eligible.
    fn select_next(&self, kind: JobKind, now: DateTime<Utc>) -> Option<JobRecord>;

    /// queued → processing, iff the current status is still `queued`.
    fn claim(&self, id: JobId, now: DateTime<Utc>) -> Result<JobRecord, JobStoreError>;

    /// processing → completed. Rejects any other current status.
    fn complete(
        &self,
        id: JobId,
        outcome: JobOutcome,
        now: DateTime<Utc>,
    ) -> Result<JobRecord, JobStoreError>;

    /// processing → failed, capturing the error text. Rejects any other
    /// current status.
    fn fail(
        &self,
        id: JobId,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<JobRecord, JobStoreError>;

    /// Failed records with their captured error text, newest first.
    fn list_failed(&self, kind: Option<JobKind>, limit: usize) -> Vec<JobRecord>;

    /// Administrative re-enqueue: clone a failed record's work into a fresh
    /// queued record. The failed record itself stays terminal.
    fn requeue_failed(&self, id: JobId, now: DateTime<Utc>) -> Result<JobRecord, JobStoreError>;

    fn stats(&self) -> JobStats;
}

/// In-memory job store; the chosen backing implementation for the in-process
/// deployment model.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn enqueue(&self, request: NewJobRecord, now: DateTime<Utc>) -> JobRecord {
        let record = JobRecord::from_request(request, now);
        debug!(
            job_id = %record.id,
            kind = %record.kind,
            priority = record.priority,
            scheduled_for = %record.scheduled_for,
            "job enqueued"
        );
        self.jobs
            .write()
            .unwrap()
            .insert(record.id, record.clone());
        record
    }

    fn get(&self, id: JobId) -> Option<JobRecord> {
        self.jobs.read().unwrap().get(&id).cloned()
    }

    fn select_next(&self, kind: JobKind, now: DateTime<Utc>) -> Option<JobRecord> {
        let jobs = self.jobs.read().unwrap();
        jobs.values()
            .filter(|j| j.kind == kind && j.is_eligible(now))
            .min_by_key(|j| (std::cmp::Reverse(j.priority), j.queued_at, j.id))
            .cloned()
    }

    fn claim(&self, id: JobId, now: DateTime<Utc>) -> Result<JobRecord, JobStoreError> {
        // Single critical section: check-and-transition under one write lock,
        // never a read-then-write pair.
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;

        if job.status != JobStatus::Queued {
            warn!(job_id = %id, status = %job.status, "claim rejected: job is not queued");
            return Err(JobStoreError::StaleTransition {
                id,
                expected: JobStatus::Queued,
                actual: job.status,
            });
        }

        job.mark_processing(now);
        debug!(job_id = %id, "job claimed");
        Ok(job.clone())
    }

    fn complete(
        &self,
        id: JobId,
        outcome: JobOutcome,
        now: DateTime<Utc>,
    ) -> Result<JobRecord, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;

        if job.status != JobStatus::Processing {
            warn!(job_id = %id, status = %job.status, "complete rejected: job is not processing");
            return Err(JobStoreError::StaleTransition {
                id,
                expected: JobStatus::Processing,
                actual: job.status,
            });
        }

        job.mark_completed(outcome, now);
        info!(job_id = %id, kind = %job.kind, "job completed");
        Ok(job.clone())
    }

    fn fail(
        &self,
        id: JobId,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<JobRecord, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;

        if job.status != JobStatus::Processing {
            warn!(job_id = %id, status = %job.status, "fail rejected: job is not processing");
            return Err(JobStoreError::StaleTransition {
                id,
                expected: JobStatus::Processing,
                actual: job.status,
            });
        }

        job.mark_failed(error, now);
        warn!(job_id = %id, kind = %job.kind, error = %error, "job failed");
        Ok(job.clone())
    }

    fn list_failed(&self, kind: Option<JobKind>, limit: usize) -> Vec<JobRecord> {
        let jobs = self.jobs.read().unwrap();
        let mut failed: Vec<_> = jobs
            .values()
            .filter(|j| j.status == JobStatus::Failed && kind.is_none_or(|k| j.kind == k))
            .cloned()
            .collect();

        failed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        failed.truncate(limit);
        failed
    }

    fn requeue_failed(&self, id: JobId, now: DateTime<Utc>) -> Result<JobRecord, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        let source = jobs.get(&id).ok_or(JobStoreError::NotFound(id))?;

        if source.status != JobStatus::Failed {
            return Err(JobStoreError::StaleTransition {
                id,
                expected: JobStatus::Failed,
                actual: source.status,
            });
        }

        let mut record = JobRecord::from_request(
            NewJobRecord {
                payload: source.payload.clone(),
                priority: source.priority,
                scheduled_for: None,
            },
            now,
        );
        record.requeue_of = Some(id);

        info!(job_id = %record.id, requeue_of = %id, "failed job re-enqueued");
        jobs.insert(record.id, record.clone());
        Ok(record)
    }

    fn stats(&self) -> JobStats {
        let jobs = self.jobs.read().unwrap();
        let mut stats = JobStats::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}
