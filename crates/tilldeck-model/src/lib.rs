#![forbid(unsafe_code)]
//! Tilldeck model SSOT: the sale record, filter specification, page result,
//! facet metadata, and summary statistics shared by the query engine, the
//! server, and the operations CLI.

mod facets;
mod filter;
mod page;
mod sale;
mod stats;

pub use facets::{
    fallback_list, FacetMetadata, FALLBACK_CATEGORIES, FALLBACK_GENDERS,
    FALLBACK_PAYMENT_METHODS, FALLBACK_REGIONS, FALLBACK_TAGS,
};
pub use filter::{FilterSpec, SortKey, DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
pub use page::{page_count, SalesPage};
pub use sale::SaleRecord;
pub use stats::SummaryStats;

pub const CRATE_NAME: &str = "tilldeck-model";
