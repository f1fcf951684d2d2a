//! Single-shot job dispatcher.
//!
//! The dispatcher owns no loop: an external trigger (scheduler tick, admin
//! action) calls [`JobDispatcher::process_next`] once, and overlapping
//! triggers are safe because the store's `claim` admits exactly one of them
//! per job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use promokit_catalog::{CategoryLookup, ProductLookup};
use promokit_config::{ConfigStore, QueueSettings};
use promokit_core::{DomainError, JobId};

use crate::generator::Generator;
use crate::model::{JobKind, JobOutcome, JobPayload, JobRecord, NewJobRecord};
use crate::store::{JobStore, JobStoreError};

/// Enqueue failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    /// Malformed payload or missing reference; rejected before any record is
    /// created.
    #[error(transparent)]
    Validation(#[from] DomainError),
}

/// Caller-supplied enqueue knobs; everything has a settings-driven default.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnqueueOptions {
    pub priority: Option<i32>,
    pub scheduled_for: Option<chrono::DateTime<Utc>>,
}

/// Outcome of one `process_next` trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// The queue is disabled in the automation settings.
    Disabled,
    /// No eligible queued job.
    Idle,
    /// A concurrent trigger claimed the selected job first; this run is a
    /// no-op.
    ClaimLost { id: JobId },
    Completed {
        id: JobId,
        output_ref: Option<String>,
        duration_ms: u64,
    },
    Failed { id: JobId, error: String },
}

/// Selects and executes the next eligible job exactly once per trigger.
pub struct JobDispatcher {
    store: Arc<dyn JobStore>,
    config: Arc<dyn ConfigStore>,
    products: Arc<dyn ProductLookup>,
    categories: Arc<dyn CategoryLookup>,
    generators: HashMap<JobKind, Box<dyn Generator>>,
}

impl JobDispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        config: Arc<dyn ConfigStore>,
        products: Arc<dyn ProductLookup>,
        categories: Arc<dyn CategoryLookup>,
    ) -> Self {
        Self {
            store,
            config,
            products,
            categories,
            generators: HashMap::new(),
        }
    }

    /// Register the generator handling one job kind.
    pub fn register_generator<G>(&mut self, kind: JobKind, generator: G)
    where
        G: Generator + 'static,
    {
        self.generators.insert(kind, Box::new(generator));
    }

    /// Validate and enqueue a job.
    ///
    /// Priority defaults to the queue's configured default; the schedule gate
    /// defaults to "now". Disabled queues still accept enqueues; they are
    /// skipped at processing time.
    pub fn enqueue(
        &self,
        payload: JobPayload,
        options: EnqueueOptions,
    ) -> Result<JobRecord, EnqueueError> {
        self.validate_payload(&payload)?;

        let kind = payload.kind();
        let priority = options
            .priority
            .unwrap_or_else(|| self.queue_settings(kind).default_priority);

        let record = self.store.enqueue(
            NewJobRecord {
                payload,
                priority,
                scheduled_for: options.scheduled_for,
            },
            Utc::now(),
        );
        Ok(record)
    }

    /// Claim and execute the next eligible job of `kind`.
    ///
    /// Failures are not auto-retried: a failed job stays failed until an
    /// administrator re-enqueues it via [`JobDispatcher::requeue`].
    pub fn process_next(&self, kind: JobKind) -> Result<ProcessResult, JobStoreError> {
        if !self.queue_settings(kind).enabled {
            debug!(kind = %kind, "queue disabled, skipping trigger");
            return Ok(ProcessResult::Disabled);
        }

        let now = Utc::now();
        let Some(candidate) = self.store.select_next(kind, now) else {
            return Ok(ProcessResult::Idle);
        };

        let claimed = match self.store.claim(candidate.id, now) {
            Ok(job) => job,
            Err(JobStoreError::StaleTransition { id, .. }) => {
                debug!(job_id = %id, "claim lost to a concurrent trigger");
                return Ok(ProcessResult::ClaimLost { id });
            }
            Err(e) => return Err(e),
        };

        let Some(generator) = self.generators.get(&kind) else {
            let error = format!("no generator registered for kind: {kind}");
            warn!(job_id = %claimed.id, error = %error, "job cannot be executed");
            self.store.fail(claimed.id, &error, Utc::now())?;
            return Ok(ProcessResult::Failed {
                id: claimed.id,
                error,
            });
        };

        let started = Instant::now();
        match generator.generate(&claimed.payload) {
            Ok(output) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                info!(
                    job_id = %claimed.id,
                    kind = %kind,
                    title = %output.content.title,
                    media = output.content.media.len(),
                    duration_ms,
                    "generation succeeded"
                );
                self.store.complete(
                    claimed.id,
                    JobOutcome::success(output.output_ref.clone(), duration_ms),
                    Utc::now(),
                )?;
                Ok(ProcessResult::Completed {
                    id: claimed.id,
                    output_ref: output.output_ref,
                    duration_ms,
                })
            }
            Err(e) => {
                let error = e.to_string();
                warn!(job_id = %claimed.id, kind = %kind, error = %error, "generation failed");
                self.store.fail(claimed.id, &error, Utc::now())?;
                Ok(ProcessResult::Failed {
                    id: claimed.id,
                    error,
                })
            }
        }
    }

    /// Administrative surface: failed jobs with their captured error text.
    pub fn failed_jobs(&self, kind: Option<JobKind>, limit: usize) -> Vec<JobRecord> {
        self.store.list_failed(kind, limit)
    }

    /// Administrative surface: re-enqueue a failed job as a fresh record.
    pub fn requeue(&self, id: JobId) -> Result<JobRecord, JobStoreError> {
        self.store.requeue_failed(id, Utc::now())
    }

    fn queue_settings(&self, kind: JobKind) -> QueueSettings {
        let settings = self.config.automation_settings();
        match kind {
            JobKind::ProductGeneration => settings.product_generation,
            JobKind::SeoOptimization => settings.seo_optimization,
        }
    }

    fn validate_payload(&self, payload: &JobPayload) -> Result<(), DomainError> {
        match payload {
            JobPayload::ProductGeneration(p) => {
                if p.keywords.is_empty() || p.keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(DomainError::validation(
                        "product generation requires at least one keyword",
                    ));
                }
                if !self.categories.category_exists(p.category_id) {
                    return Err(DomainError::validation(format!(
                        "unknown category: {}",
                        p.category_id
                    )));
                }
            }
            JobPayload::SeoOptimization(p) => {
                if !self.products.product_exists(p.product_id) {
                    return Err(DomainError::validation(format!(
                        "unknown product: {}",
                        p.product_id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{ContentMetadata, GeneratedContent, GenerationError, GenerationOutput};
    use crate::model::{
        JobStatus, OptimizationType, ProductGenerationPayload, SeoOptimizationPayload,
    };
    use crate::store::InMemoryJobStore;
    use promokit_catalog::{Category, InMemoryCatalog, ProductSummary};
    use promokit_config::{AutomationSettings, StaticConfigStore};
    use promokit_core::{CategoryId, ProductId};
    use std::sync::Barrier;

    struct StubGenerator {
        outcome: Result<GenerationOutput, GenerationError>,
        delay: Option<std::time::Duration>,
    }

    impl StubGenerator {
        fn ok(output_ref: &str) -> Self {
            Self {
                outcome: Ok(GenerationOutput::new(test_content()).with_output_ref(output_ref)),
                delay: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                outcome: Err(GenerationError::Provider(message.to_string())),
                delay: None,
            }
        }

        fn slow(output_ref: &str, delay: std::time::Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::ok(output_ref)
            }
        }
    }

    impl Generator for StubGenerator {
        fn generate(&self, _payload: &JobPayload) -> Result<GenerationOutput, GenerationError> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.outcome.clone()
        }
    }

    fn test_content() -> GeneratedContent {
        GeneratedContent {
            title: "Walnut Standing Desk".to_string(),
            body: "A generously sized desk in oiled walnut.".to_string(),
            media: Vec::new(),
            metadata: ContentMetadata::default(),
        }
    }

    struct Fixture {
        dispatcher: JobDispatcher,
        store: Arc<InMemoryJobStore>,
        category_id: CategoryId,
        product_id: ProductId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryJobStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());

        let category_id = CategoryId::new();
        catalog.insert_category(Category::new(category_id, "Desks", "desks"));
        let product_id = ProductId::new();
        catalog.insert_product(ProductSummary::new(product_id, "Walnut Standing Desk"));

        let dispatcher = JobDispatcher::new(
            store.clone(),
            Arc::new(StaticConfigStore::default()),
            catalog.clone(),
            catalog,
        );

        Fixture {
            dispatcher,
            store,
            category_id,
            product_id,
        }
    }

    fn generation_payload(category_id: CategoryId) -> JobPayload {
        JobPayload::ProductGeneration(ProductGenerationPayload {
            keywords: vec!["walnut desk".to_string()],
            category_id,
        })
    }

    #[test]
    fn enqueue_rejects_missing_category() {
        let f = fixture();
        let err = f
            .dispatcher
            .enqueue(generation_payload(CategoryId::new()), EnqueueOptions::default())
            .unwrap_err();
        assert!(matches!(err, EnqueueError::Validation(DomainError::Validation(_))));

        // Nothing was created.
        assert_eq!(f.store.stats().queued, 0);
    }

    #[test]
    fn enqueue_rejects_empty_keywords() {
        let f = fixture();
        let payload = JobPayload::ProductGeneration(ProductGenerationPayload {
            keywords: vec!["   ".to_string()],
            category_id: f.category_id,
        });
        assert!(f.dispatcher.enqueue(payload, EnqueueOptions::default()).is_err());
    }

    #[test]
    fn enqueue_rejects_missing_product_reference() {
        let f = fixture();
        let payload = JobPayload::SeoOptimization(SeoOptimizationPayload {
            product_id: ProductId::new(),
            optimization_type: OptimizationType::Initial,
        });
        assert!(f.dispatcher.enqueue(payload, EnqueueOptions::default()).is_err());

        // A resolvable product passes validation.
        let payload = JobPayload::SeoOptimization(SeoOptimizationPayload {
            product_id: f.product_id,
            optimization_type: OptimizationType::Initial,
        });
        assert!(f.dispatcher.enqueue(payload, EnqueueOptions::default()).is_ok());
    }

    #[test]
    fn enqueue_applies_default_priority_from_settings() {
        let store = Arc::new(InMemoryJobStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let category_id = CategoryId::new();
        catalog.insert_category(Category::new(category_id, "Desks", "desks"));

        let mut automation = AutomationSettings::default();
        automation.product_generation.default_priority = 7;
        let config = Arc::new(StaticConfigStore::default());
        config.replace_automation(automation);

        let dispatcher =
            JobDispatcher::new(store, config, catalog.clone(), catalog);

        let record = dispatcher
            .enqueue(generation_payload(category_id), EnqueueOptions::default())
            .unwrap();
        assert_eq!(record.priority, 7);

        let explicit = dispatcher
            .enqueue(
                generation_payload(category_id),
                EnqueueOptions {
                    priority: Some(2),
                    ..EnqueueOptions::default()
                },
            )
            .unwrap();
        assert_eq!(explicit.priority, 2);
    }

    #[test]
    fn process_next_completes_the_job_and_records_the_outcome() {
        let mut f = fixture();
        f.dispatcher
            .register_generator(JobKind::ProductGeneration, StubGenerator::ok("products/walnut-desk"));

        let record = f
            .dispatcher
            .enqueue(generation_payload(f.category_id), EnqueueOptions::default())
            .unwrap();

        let result = f.dispatcher.process_next(JobKind::ProductGeneration).unwrap();
        match result {
            ProcessResult::Completed { id, output_ref, .. } => {
                assert_eq!(id, record.id);
                assert_eq!(output_ref.as_deref(), Some("products/walnut-desk"));
            }
            other => panic!("expected Completed, got {other:?}"),
        }

        let stored = f.store.get(record.id).unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert!(stored.processing_started_at.is_some());
        let outcome = stored.outcome.unwrap();
        assert!(outcome.success);
        assert!(outcome.duration_ms.is_some());
    }

    #[test]
    fn process_next_is_idle_on_an_empty_queue() {
        let f = fixture();
        assert_eq!(
            f.dispatcher.process_next(JobKind::ProductGeneration).unwrap(),
            ProcessResult::Idle
        );
    }

    #[test]
    fn process_next_skips_disabled_queues() {
        let store = Arc::new(InMemoryJobStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let mut automation = AutomationSettings::default();
        automation.seo_optimization.enabled = false;
        let config = Arc::new(StaticConfigStore::default());
        config.replace_automation(automation);

        let dispatcher = JobDispatcher::new(store, config, catalog.clone(), catalog);
        assert_eq!(
            dispatcher.process_next(JobKind::SeoOptimization).unwrap(),
            ProcessResult::Disabled
        );
    }

    #[test]
    fn generation_failure_marks_the_job_failed_and_moves_on() {
        let mut f = fixture();
        f.dispatcher.register_generator(
            JobKind::ProductGeneration,
            StubGenerator::failing("model unavailable"),
        );

        let doomed = f
            .dispatcher
            .enqueue(
                generation_payload(f.category_id),
                EnqueueOptions {
                    priority: Some(9),
                    ..EnqueueOptions::default()
                },
            )
            .unwrap();
        let survivor = f
            .dispatcher
            .enqueue(generation_payload(f.category_id), EnqueueOptions::default())
            .unwrap();

        let result = f.dispatcher.process_next(JobKind::ProductGeneration).unwrap();
        match result {
            ProcessResult::Failed { id, error } => {
                assert_eq!(id, doomed.id);
                assert!(error.contains("model unavailable"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        // One failing job never blocks the next: the survivor is still
        // selectable and the failure is captured on the record.
        let stored = f.store.get(doomed.id).unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(f.store.get(survivor.id).unwrap().status, JobStatus::Queued);

        let failed = f.dispatcher.failed_jobs(Some(JobKind::ProductGeneration), 10);
        assert_eq!(failed.len(), 1);
    }

    #[test]
    fn missing_generator_fails_the_claimed_job() {
        let f = fixture();
        f.dispatcher
            .enqueue(generation_payload(f.category_id), EnqueueOptions::default())
            .unwrap();

        let result = f.dispatcher.process_next(JobKind::ProductGeneration).unwrap();
        assert!(matches!(result, ProcessResult::Failed { ref error, .. }
            if error.contains("no generator registered")));
    }

    #[test]
    fn requeue_makes_a_failed_job_processable_again() {
        let mut f = fixture();
        f.dispatcher.register_generator(
            JobKind::ProductGeneration,
            StubGenerator::failing("transient outage"),
        );

        let record = f
            .dispatcher
            .enqueue(generation_payload(f.category_id), EnqueueOptions::default())
            .unwrap();
        f.dispatcher.process_next(JobKind::ProductGeneration).unwrap();

        let requeued = f.dispatcher.requeue(record.id).unwrap();
        assert_eq!(requeued.requeue_of, Some(record.id));
        assert_eq!(requeued.status, JobStatus::Queued);

        // The new record is picked up by the next trigger.
        let result = f.dispatcher.process_next(JobKind::ProductGeneration).unwrap();
        assert!(matches!(result, ProcessResult::Failed { id, .. } if id == requeued.id));
    }

    #[test]
    fn concurrent_triggers_execute_a_single_job_exactly_once() {
        let mut f = fixture();
        f.dispatcher.register_generator(
            JobKind::ProductGeneration,
            StubGenerator::slow("products/walnut-desk", std::time::Duration::from_millis(25)),
        );

        f.dispatcher
            .enqueue(generation_payload(f.category_id), EnqueueOptions::default())
            .unwrap();

        let dispatcher = Arc::new(f.dispatcher);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    dispatcher.process_next(JobKind::ProductGeneration).unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let completed = results
            .iter()
            .filter(|r| matches!(r, ProcessResult::Completed { .. }))
            .count();
        assert_eq!(completed, 1, "exactly one trigger must win: {results:?}");

        // The loser observed either the claim race or an already-empty queue.
        assert!(results
            .iter()
            .all(|r| matches!(
                r,
                ProcessResult::Completed { .. } | ProcessResult::ClaimLost { .. } | ProcessResult::Idle
            )));

        assert_eq!(f.store.stats().completed, 1);
    }
}
