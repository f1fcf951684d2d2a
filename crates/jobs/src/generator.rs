//! Generator adapter contract.
//!
//! Content production (AI providers, image services) happens outside the
//! core. The worker only sees a blocking call that either yields content or
//! an error it records on the job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::JobPayload;

/// A media asset referenced by generated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub alt_text: Option<String>,
}

/// SEO metadata attached to generated content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Vec<String>,
}

/// Content produced for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub body: String,
    pub media: Vec<MediaAsset>,
    pub metadata: ContentMetadata,
}

/// Successful generation: the content plus a reference to wherever the
/// adapter delivered it (a draft document, an updated product page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub content: GeneratedContent,
    pub output_ref: Option<String>,
}

impl GenerationOutput {
    pub fn new(content: GeneratedContent) -> Self {
        Self {
            content,
            output_ref: None,
        }
    }

    pub fn with_output_ref(mut self, output_ref: impl Into<String>) -> Self {
        self.output_ref = Some(output_ref.into());
        self
    }
}

/// Generation failure, captured verbatim on the failed job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The external provider failed (network, quota, 5xx...).
    #[error("generation provider failed: {0}")]
    Provider(String),

    /// The provider refused the payload as unprocessable.
    #[error("payload rejected by generator: {0}")]
    Rejected(String),
}

/// External content-producing capability.
///
/// Calls are blocking and potentially slow; the worker holds no lock beyond
/// the already-claimed job while one is in flight.
pub trait Generator: Send + Sync {
    fn generate(&self, payload: &JobPayload) -> Result<GenerationOutput, GenerationError>;
}
