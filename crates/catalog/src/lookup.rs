//! Lookup traits resolving foreign-key references.
//!
//! Implemented by the surrounding application over its own persistence; the
//! in-memory variant backs tests and single-process deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use promokit_core::{CategoryId, ProductId};

use crate::category::Category;
use crate::product::ProductSummary;

/// Resolve product references.
pub trait ProductLookup: Send + Sync {
    fn product(&self, id: ProductId) -> Option<ProductSummary>;

    fn product_exists(&self, id: ProductId) -> bool {
        self.product(id).is_some()
    }
}

/// Resolve category references.
pub trait CategoryLookup: Send + Sync {
    fn category(&self, id: CategoryId) -> Option<Category>;

    fn category_exists(&self, id: CategoryId) -> bool {
        self.category(id).is_some()
    }
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, ProductSummary>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&self, product: ProductSummary) {
        self.products
            .write()
            .unwrap()
            .insert(product.id, product);
    }

    pub fn insert_category(&self, category: Category) {
        self.categories
            .write()
            .unwrap()
            .insert(category.id, category);
    }
}

impl ProductLookup for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Option<ProductSummary> {
        self.products
            .read()
            .unwrap()
            .get(&id)
            .cloned()
    }
}

impl CategoryLookup for InMemoryCatalog {
    fn category(&self, id: CategoryId) -> Option<Category> {
        self.categories
            .read()
            .unwrap()
            .get(&id)
            .cloned()
    }
}
