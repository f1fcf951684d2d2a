//! Inquiry events consumed by the planner.
//!
//! Events arrive from the inquiry CRUD layer with product references already
//! resolved to catalog summaries, so planning stays a pure computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promokit_catalog::ProductSummary;
use promokit_core::{InquiryId, Recipient};

/// Event: a sales inquiry was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryCreated {
    pub inquiry_id: InquiryId,
    pub products: Vec<ProductSummary>,
    pub customer: Recipient,
    /// Free-text message the customer left, if any.
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InquiryCreated {
    pub fn event_type(&self) -> &'static str {
        "inquiries.inquiry.created"
    }
}

/// Event: an inquiry's status moved to "quoted".
///
/// Emitted by the CRUD layer on the status transition itself; the planner is
/// re-invoked per event, it never polls for quoted inquiries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryQuoted {
    pub inquiry_id: InquiryId,
    pub products: Vec<ProductSummary>,
    pub customer: Recipient,
    pub quoted_at: DateTime<Utc>,
}

impl InquiryQuoted {
    pub fn event_type(&self) -> &'static str {
        "inquiries.inquiry.quoted"
    }
}
