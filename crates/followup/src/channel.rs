//! Channel adapter contract.
//!
//! Actual delivery (SMTP, WhatsApp, SMS gateways) happens outside the core.
//! The dispatcher only sees a blocking call that either delivers a record or
//! fails it.

use thiserror::Error;

use crate::model::FollowUpRecord;

/// Delivery failure, captured verbatim on the failed record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The transport failed (connection refused, gateway 5xx...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The transport rejected the message or its recipient.
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// External capability delivering a follow-up message.
///
/// Calls are blocking and potentially slow; the dispatcher holds no lock
/// while one is in flight.
pub trait Channel: Send + Sync {
    fn send(&self, record: &FollowUpRecord) -> Result<(), SendError>;
}
