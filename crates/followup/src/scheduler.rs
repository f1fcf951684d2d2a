//! Event-driven planning service.

use std::sync::Arc;

use tracing::{error, info};

use promokit_config::ConfigStore;

use crate::event::{InquiryCreated, InquiryQuoted};
use crate::model::FollowUpRecord;
use crate::planner::{plan_follow_ups, plan_quote_follow_ups, PlanError};
use crate::store::FollowUpStore;

/// Plans and persists follow-up batches in response to inquiry events.
///
/// Settings are read through the injected [`ConfigStore`] at each event, so a
/// refreshed snapshot applies to the next inquiry without any restart.
pub struct FollowUpScheduler {
    store: Arc<dyn FollowUpStore>,
    config: Arc<dyn ConfigStore>,
}

impl FollowUpScheduler {
    pub fn new(store: Arc<dyn FollowUpStore>, config: Arc<dyn ConfigStore>) -> Self {
        Self { store, config }
    }

    /// Fan out and persist the batch for a freshly created inquiry.
    ///
    /// A planning failure leaves no records behind; the inquiry itself is the
    /// caller's to persist either way.
    pub fn on_inquiry_created(
        &self,
        event: &InquiryCreated,
    ) -> Result<Vec<FollowUpRecord>, PlanError> {
        let settings = self.config.follow_up_settings();
        let records = plan_follow_ups(&settings, event).inspect_err(|e| {
            error!(inquiry_id = %event.inquiry_id, error = %e, "follow-up planning failed");
        })?;

        self.store.insert_batch(&records);
        info!(
            inquiry_id = %event.inquiry_id,
            event = event.event_type(),
            count = records.len(),
            "follow-up batch scheduled"
        );
        Ok(records)
    }

    /// Re-trigger on the "quoted" status transition.
    pub fn on_inquiry_quoted(
        &self,
        event: &InquiryQuoted,
    ) -> Result<Vec<FollowUpRecord>, PlanError> {
        let settings = self.config.follow_up_settings();
        let records = plan_quote_follow_ups(&settings, event).inspect_err(|e| {
            error!(inquiry_id = %event.inquiry_id, error = %e, "quote follow-up planning failed");
        })?;

        self.store.insert_batch(&records);
        info!(
            inquiry_id = %event.inquiry_id,
            event = event.event_type(),
            count = records.len(),
            "quote follow-up batch scheduled"
        );
        Ok(records)
    }
}
