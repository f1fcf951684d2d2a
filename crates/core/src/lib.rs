//! `promokit-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod contact;
pub mod error;
pub mod id;

pub use contact::Recipient;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, FollowUpId, InquiryId, JobId, ProductId};
