//! Follow-up persistence and the conditional send transitions.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use promokit_core::{FollowUpId, InquiryId};

use crate::model::{FollowUpRecord, FollowUpStatus};

/// Follow-up store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FollowUpStoreError {
    #[error("follow-up not found: {0}")]
    NotFound(FollowUpId),

    /// A send transition was attempted on a record that is no longer pending.
    #[error("stale transition for follow-up {id}: expected {expected}, found {actual}")]
    StaleTransition {
        id: FollowUpId,
        expected: FollowUpStatus,
        actual: FollowUpStatus,
    },
}

/// Persistence seam for follow-up records.
pub trait FollowUpStore: Send + Sync {
    /// Persist a planned batch. Scheduled times are fixed at creation.
    fn insert_batch(&self, records: &[FollowUpRecord]);

    fn get(&self, id: FollowUpId) -> Option<FollowUpRecord>;

    /// All `pending` records with `scheduled_time <= now`, ordered by
    /// scheduled time then id.
    fn scan_due(&self, now: DateTime<Utc>) -> Vec<FollowUpRecord>;

    /// pending → sent, stamping `sent_time`. Rejects any other current
    /// status.
    fn mark_sent(
        &self,
        id: FollowUpId,
        now: DateTime<Utc>,
    ) -> Result<FollowUpRecord, FollowUpStoreError>;

    /// pending → failed, capturing the send error. Rejects any other current
    /// status.
    fn mark_failed(
        &self,
        id: FollowUpId,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<FollowUpRecord, FollowUpStoreError>;

    /// Every record planned for one inquiry, ordered by scheduled time.
    fn list_by_inquiry(&self, inquiry_id: InquiryId) -> Vec<FollowUpRecord>;

    /// Failed records with their captured error text, newest first.
    fn list_failed(&self, limit: usize) -> Vec<FollowUpRecord>;
}

/// In-memory follow-up store; the chosen backing implementation for the
/// in-process deployment model.
#[derive(Debug, Default)]
pub struct InMemoryFollowUpStore {
    records: RwLock<HashMap<FollowUpId, FollowUpRecord>>,
}

impl InMemoryFollowUpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FollowUpStore for InMemoryFollowUpStore {
    fn insert_batch(&self, records: &[FollowUpRecord]) {
        if records.is_empty() {
            return;
        }
        let mut map = self.records.write().unwrap();
        for record in records {
            debug!(
                follow_up_id = %record.id,
                inquiry_id = %record.inquiry_id,
                kind = %record.kind,
                channel = %record.channel,
                scheduled_time = %record.scheduled_time,
                "follow-up scheduled"
            );
            map.insert(record.id, record.clone());
        }
    }

    fn get(&self, id: FollowUpId) -> Option<FollowUpRecord> {
        self.records.read().unwrap().get(&id).cloned()
    }

    fn scan_due(&self, now: DateTime<Utc>) -> Vec<FollowUpRecord> {
        let records = self.records.read().unwrap();
        let mut due: Vec<_> = records
            .values()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|r| (r.scheduled_time, r.id));
        due
    }

    fn mark_sent(
        &self,
        id: FollowUpId,
        now: DateTime<Utc>,
    ) -> Result<FollowUpRecord, FollowUpStoreError> {
        // Check-and-transition under one write lock.
        let mut records = self.records.write().unwrap();
        let record = records.get_mut(&id).ok_or(FollowUpStoreError::NotFound(id))?;

        if record.status != FollowUpStatus::Pending {
            warn!(follow_up_id = %id, status = %record.status, "mark_sent rejected: not pending");
            return Err(FollowUpStoreError::StaleTransition {
                id,
                expected: FollowUpStatus::Pending,
                actual: record.status,
            });
        }

        record.mark_sent(now);
        info!(follow_up_id = %id, channel = %record.channel, "follow-up sent");
        Ok(record.clone())
    }

    fn mark_failed(
        &self,
        id: FollowUpId,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<FollowUpRecord, FollowUpStoreError> {
        let mut records = self.records.write().unwrap();
        let record = records.get_mut(&id).ok_or(FollowUpStoreError::NotFound(id))?;

        if record.status != FollowUpStatus::Pending {
            warn!(follow_up_id = %id, status = %record.status, "mark_failed rejected: not pending");
            return Err(FollowUpStoreError::StaleTransition {
                id,
                expected: FollowUpStatus::Pending,
                actual: record.status,
            });
        }

        record.mark_failed(error, now);
        warn!(follow_up_id = %id, channel = %record.channel, error = %error, "follow-up failed");
        Ok(record.clone())
    }

    fn list_by_inquiry(&self, inquiry_id: InquiryId) -> Vec<FollowUpRecord> {
        let records = self.records.read().unwrap();
        let mut matching: Vec<_> = records
            .values()
            .filter(|r| r.inquiry_id == inquiry_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.scheduled_time, r.id));
        matching
    }

    fn list_failed(&self, limit: usize) -> Vec<FollowUpRecord> {
        let records = self.records.read().unwrap();
        let mut failed: Vec<_> = records
            .values()
            .filter(|r| r.status == FollowUpStatus::Failed)
            .cloned()
            .collect();
        failed.sort_by(|a, b| b.sent_time.cmp(&a.sent_time));
        failed.truncate(limit);
        failed
    }
}
