//! Core job types and the status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promokit_core::{CategoryId, JobId, ProductId};

/// Job kind: which queue the job belongs to and which generator handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ProductGeneration,
    SeoOptimization,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::ProductGeneration => "product_generation",
            JobKind::SeoOptimization => "seo_optimization",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job execution status.
///
/// The only legal paths are `queued → processing → completed` and
/// `queued → processing → failed`. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an SEO job came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationType {
    Initial,
    Refresh,
    PerformanceBased,
}

/// Payload for generating a new product page from keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductGenerationPayload {
    pub keywords: Vec<String>,
    pub category_id: CategoryId,
}

/// Payload for (re-)optimizing an existing product's SEO content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoOptimizationPayload {
    pub product_id: ProductId,
    pub optimization_type: OptimizationType,
}

/// Typed job payload; the kind is derived from the variant, so a payload can
/// never land in the wrong queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    ProductGeneration(ProductGenerationPayload),
    SeoOptimization(SeoOptimizationPayload),
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::ProductGeneration(_) => JobKind::ProductGeneration,
            JobPayload::SeoOptimization(_) => JobKind::SeoOptimization,
        }
    }
}

/// Final outcome recorded by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub success: bool,
    pub error: Option<String>,
    /// Reference to wherever the generated content was delivered.
    pub output_ref: Option<String>,
    pub duration_ms: Option<u64>,
}

impl JobOutcome {
    pub fn success(output_ref: Option<String>, duration_ms: u64) -> Self {
        Self {
            success: true,
            error: None,
            output_ref,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            output_ref: None,
            duration_ms: None,
        }
    }
}

/// Request to create a job; the store assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobRecord {
    pub payload: JobPayload,
    pub priority: i32,
    /// Not-before gate. `None` means eligible immediately.
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// A unit of generation/optimization work tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub kind: JobKind,
    pub payload: JobPayload,
    pub priority: i32,
    pub status: JobStatus,
    /// Not-before gate; eligibility, not a guarantee of selection.
    pub scheduled_for: DateTime<Utc>,
    pub queued_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: Option<JobOutcome>,
    /// Set on records created by an administrative re-enqueue of a failed job.
    pub requeue_of: Option<JobId>,
}

impl JobRecord {
    /// Materialize a new queued record from an enqueue request.
    pub fn from_request(request: NewJobRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            kind: request.payload.kind(),
            payload: request.payload,
            priority: request.priority,
            status: JobStatus::Queued,
            scheduled_for: request.scheduled_for.unwrap_or(now),
            queued_at: now,
            processing_started_at: None,
            completed_at: None,
            outcome: None,
            requeue_of: None,
        }
    }

    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Queued && self.scheduled_for <= now
    }

    /// Claim: queued → processing. The store verifies the precondition.
    pub(crate) fn mark_processing(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Processing;
        self.processing_started_at = Some(now);
    }

    /// Finalize: processing → completed.
    pub(crate) fn mark_completed(&mut self, outcome: JobOutcome, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        self.outcome = Some(outcome);
    }

    /// Finalize: processing → failed.
    pub(crate) fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.completed_at = Some(now);
        self.outcome = Some(JobOutcome::failure(error));
    }
}
