//! Placeholder substitution for follow-up templates.
//!
//! Deliberately not a template engine: the placeholder set is closed and every
//! value has a neutral fallback, so rendering can never fail a record.

use chrono::{DateTime, Utc};

use promokit_catalog::ProductSummary;
use promokit_core::Recipient;

pub(crate) const PLACEHOLDERS: [&str; 6] = [
    "{customer_name}",
    "{product_names}",
    "{product_links}",
    "{product_details}",
    "{inquiry_date}",
    "{inquiry_details}",
];

/// Values substituted into a rule's template, computed once per event.
#[derive(Debug, Clone)]
pub(crate) struct RenderContext {
    customer_name: String,
    product_names: String,
    product_links: String,
    product_details: String,
    inquiry_date: String,
    inquiry_details: String,
}

impl RenderContext {
    pub(crate) fn new(
        customer: &Recipient,
        products: &[ProductSummary],
        message: Option<&str>,
        inquiry_date: DateTime<Utc>,
    ) -> Self {
        let customer_name = non_blank(&customer.name).unwrap_or("there").to_string();

        let titles: Vec<&str> = products
            .iter()
            .filter_map(|p| non_blank(&p.title))
            .collect();
        let product_names = if titles.is_empty() {
            "our products".to_string()
        } else {
            titles.join(", ")
        };

        let links: Vec<&str> = products
            .iter()
            .filter_map(|p| p.link.as_deref().and_then(non_blank))
            .collect();
        let product_links = if links.is_empty() {
            "our catalog".to_string()
        } else {
            links.join("\n")
        };

        let details: Vec<String> = products
            .iter()
            .filter_map(|p| {
                let title = non_blank(&p.title)?;
                Some(match p.details.as_deref().and_then(non_blank) {
                    Some(details) => format!("{title}: {details}"),
                    None => title.to_string(),
                })
            })
            .collect();
        let product_details = if details.is_empty() {
            product_names.clone()
        } else {
            details.join("\n")
        };

        Self {
            customer_name,
            product_names,
            product_links,
            product_details,
            inquiry_date: inquiry_date.format("%d %B %Y").to_string(),
            inquiry_details: message
                .and_then(non_blank)
                .unwrap_or("No additional details were provided.")
                .to_string(),
        }
    }

    pub(crate) fn render(&self, template: &str) -> String {
        template
            .replace("{customer_name}", &self.customer_name)
            .replace("{product_names}", &self.product_names)
            .replace("{product_links}", &self.product_links)
            .replace("{product_details}", &self.product_details)
            .replace("{inquiry_date}", &self.inquiry_date)
            .replace("{inquiry_details}", &self.inquiry_details)
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
