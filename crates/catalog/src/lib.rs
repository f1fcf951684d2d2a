//! `promokit-catalog` — catalog reference data consumed by the automation core.
//!
//! The catalog itself (CRUD, persistence) lives outside this workspace; this
//! crate carries the read-side summaries the job pipeline validates against
//! and the follow-up planner renders from, plus the lookup traits the
//! surrounding application implements.

pub mod category;
pub mod lookup;
pub mod product;

pub use category::Category;
pub use lookup::{CategoryLookup, InMemoryCatalog, ProductLookup};
pub use product::ProductSummary;
