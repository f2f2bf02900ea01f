use serde::{Deserialize, Serialize};

/// Built-in facet lists served when a distinct-value query cannot be
/// answered. Availability of the filter panel wins over freshness here; the
/// boundary substitutes these per facet, not wholesale.
pub const FALLBACK_REGIONS: [&str; 4] = ["North", "South", "East", "West"];
pub const FALLBACK_GENDERS: [&str; 2] = ["Male", "Female"];
pub const FALLBACK_CATEGORIES: [&str; 4] = ["Electronics", "Fashion", "Home", "Sports"];
pub const FALLBACK_PAYMENT_METHODS: [&str; 4] = ["Credit Card", "Debit Card", "UPI", "Cash"];
pub const FALLBACK_TAGS: [&str; 5] = ["premium", "discount", "new", "sale", "bestseller"];

/// Distinct values currently present in the store for each filterable
/// column. Tag values are already exploded from their comma-joined storage
/// form, cleaned, deduplicated, and sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetMetadata {
    pub regions: Vec<String>,
    pub genders: Vec<String>,
    pub categories: Vec<String>,
    pub payment_methods: Vec<String>,
    pub tags: Vec<String>,
}

impl FacetMetadata {
    #[must_use]
    pub fn builtin_fallback() -> Self {
        Self {
            regions: fallback_list(&FALLBACK_REGIONS),
            genders: fallback_list(&FALLBACK_GENDERS),
            categories: fallback_list(&FALLBACK_CATEGORIES),
            payment_methods: fallback_list(&FALLBACK_PAYMENT_METHODS),
            tags: fallback_list(&FALLBACK_TAGS),
        }
    }
}

#[must_use]
pub fn fallback_list(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
