use serde::{Deserialize, Serialize};

/// Whole-table summary statistics. The summary deliberately ignores any
/// active filter: it describes the dataset, not the current result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_transactions: u64,
    pub total_revenue: f64,
    pub avg_transaction: f64,
    pub unique_customers: u64,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
}

impl SummaryStats {
    /// All-zero/null summary substituted when the store cannot be reached.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_transactions: 0,
            total_revenue: 0.0,
            avg_transaction: 0.0,
            unique_customers: 0,
            earliest_date: None,
            latest_date: None,
        }
    }
}
