//! Due-record dispatcher.
//!
//! An external trigger (periodic tick) calls
//! [`FollowUpDispatcher::scan_and_send_due`]; each due record is delivered
//! over its channel's registered transport and finalized. One failing record
//! never blocks the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::model::{FollowUpChannel, FollowUpRecord};
use crate::store::{FollowUpStore, FollowUpStoreError};

/// Outcome of one scan: how many records were sent and how many failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Scans due follow-ups and drives the channel transports.
pub struct FollowUpDispatcher {
    store: Arc<dyn FollowUpStore>,
    channels: HashMap<FollowUpChannel, Box<dyn Channel>>,
}

impl FollowUpDispatcher {
    pub fn new(store: Arc<dyn FollowUpStore>) -> Self {
        Self {
            store,
            channels: HashMap::new(),
        }
    }

    /// Register the transport handling one channel.
    pub fn register_channel<C>(&mut self, channel: FollowUpChannel, transport: C)
    where
        C: Channel + 'static,
    {
        self.channels.insert(channel, Box::new(transport));
    }

    /// Send everything due at `now`.
    ///
    /// Each record is marked `sent` or `failed` with its `sent_time`; there
    /// is no retry for failed sends. A record finalized by a concurrent scan
    /// between selection and transition is skipped silently.
    pub fn scan_and_send_due(&self, now: DateTime<Utc>) -> DispatchSummary {
        let due = self.store.scan_due(now);
        if due.is_empty() {
            return DispatchSummary::default();
        }
        debug!(count = due.len(), "dispatching due follow-ups");

        let mut summary = DispatchSummary::default();
        for record in due {
            let result = match self.channels.get(&record.channel) {
                Some(transport) => transport.send(&record),
                None => Err(crate::channel::SendError::Transport(format!(
                    "no transport registered for channel: {}",
                    record.channel
                ))),
            };

            let transition = match result {
                Ok(()) => {
                    summary.processed += 1;
                    self.store.mark_sent(record.id, now)
                }
                Err(e) => {
                    summary.failed += 1;
                    self.store.mark_failed(record.id, &e.to_string(), now)
                }
            };

            match transition {
                Ok(_) => {}
                Err(FollowUpStoreError::StaleTransition { id, actual, .. }) => {
                    debug!(follow_up_id = %id, status = %actual, "record finalized concurrently");
                }
                Err(e) => {
                    warn!(follow_up_id = %record.id, error = %e, "failed to finalize follow-up");
                }
            }
        }

        summary
    }

    /// Administrative surface: failed records with their captured error text.
    pub fn failed_follow_ups(&self, limit: usize) -> Vec<FollowUpRecord> {
        self.store.list_failed(limit)
    }
}
