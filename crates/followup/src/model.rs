//! Follow-up record types and their status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promokit_core::{FollowUpId, InquiryId, ProductId, Recipient};

/// What a follow-up communication is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    /// Immediate acknowledgement to the customer.
    AutoResponse,
    /// Nudge to staff that an inquiry is waiting.
    Reminder,
    /// Sent after a quote went out.
    QuoteFollowUp,
    /// Automated customer check-in after the initial exchange.
    ThankYou,
}

impl FollowUpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpKind::AutoResponse => "auto_response",
            FollowUpKind::Reminder => "reminder",
            FollowUpKind::QuoteFollowUp => "quote_followup",
            FollowUpKind::ThankYou => "thank_you",
        }
    }
}

impl std::fmt::Display for FollowUpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpChannel {
    Email,
    Whatsapp,
    Sms,
}

impl FollowUpChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpChannel::Email => "email",
            FollowUpChannel::Whatsapp => "whatsapp",
            FollowUpChannel::Sms => "sms",
        }
    }
}

impl std::fmt::Display for FollowUpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up status.
///
/// The dispatcher only ever performs `pending → sent` and `pending → failed`.
/// `responded`/`completed` are written by the surrounding CRM once a customer
/// reacts; the core treats every non-pending status as terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpStatus {
    Pending,
    Sent,
    Responded,
    Completed,
    Failed,
}

impl FollowUpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpStatus::Pending => "pending",
            FollowUpStatus::Sent => "sent",
            FollowUpStatus::Responded => "responded",
            FollowUpStatus::Completed => "completed",
            FollowUpStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, FollowUpStatus::Pending)
    }
}

impl std::fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered message carried by a follow-up record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub subject: Option<String>,
    pub body: String,
    /// Products the inquiry was about, for the admin surface and CRM links.
    pub product_ids: Vec<ProductId>,
}

/// A scheduled, single-channel communication derived from an inquiry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRecord {
    pub id: FollowUpId,
    pub inquiry_id: InquiryId,
    pub kind: FollowUpKind,
    pub channel: FollowUpChannel,
    /// Absolute send time, fixed at creation.
    pub scheduled_time: DateTime<Utc>,
    pub sent_time: Option<DateTime<Utc>>,
    pub status: FollowUpStatus,
    pub content: MessageContent,
    pub recipient: Recipient,
    /// Captured send error, for the administrative surface.
    pub error: Option<String>,
}

impl FollowUpRecord {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == FollowUpStatus::Pending && self.scheduled_time <= now
    }

    pub(crate) fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.status = FollowUpStatus::Sent;
        self.sent_time = Some(now);
    }

    pub(crate) fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = FollowUpStatus::Failed;
        self.sent_time = Some(now);
        self.error = Some(error.into());
    }
}
