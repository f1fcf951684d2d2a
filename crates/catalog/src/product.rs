use serde::{Deserialize, Serialize};

use promokit_core::{CategoryId, ProductId};

/// Read-side product summary.
///
/// This is the shape the automation core works with: enough to validate a
/// job payload reference and to render customer-facing follow-up copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    /// Public storefront URL, when the product has been published.
    pub link: Option<String>,
    /// Short marketing description.
    pub details: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductSummary {
    pub fn new(id: ProductId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            link: None,
            details: None,
            category_id: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}
