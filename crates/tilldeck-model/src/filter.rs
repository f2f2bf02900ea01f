// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Sort keys accepted by the browse endpoint. The key-to-column table is a
/// wire contract; unknown keys fall back to [`SortKey::DateDesc`] instead of
/// failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    QuantityDesc,
    QuantityAsc,
    CustomerAsc,
    CustomerDesc,
    AmountDesc,
    AmountAsc,
}

impl SortKey {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "date_desc" => Self::DateDesc,
            "date_asc" => Self::DateAsc,
            "quantity_desc" => Self::QuantityDesc,
            "quantity_asc" => Self::QuantityAsc,
            "customer_asc" => Self::CustomerAsc,
            "customer_desc" => Self::CustomerDesc,
            "amount_desc" => Self::AmountDesc,
            "amount_asc" => Self::AmountAsc,
            _ => Self::default(),
        }
    }

    /// Resolved `(column, direction)` pair for ORDER BY assembly. Both sides
    /// are static table entries, never caller input.
    #[must_use]
    pub const fn order(self) -> (&'static str, &'static str) {
        match self {
            Self::DateDesc => ("date", "DESC"),
            Self::DateAsc => ("date", "ASC"),
            Self::QuantityDesc => ("quantity", "DESC"),
            Self::QuantityAsc => ("quantity", "ASC"),
            Self::CustomerAsc => ("customer_name", "ASC"),
            Self::CustomerDesc => ("customer_name", "DESC"),
            Self::AmountDesc => ("final_amount", "DESC"),
            Self::AmountAsc => ("final_amount", "ASC"),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateDesc => "date_desc",
            Self::DateAsc => "date_asc",
            Self::QuantityDesc => "quantity_desc",
            Self::QuantityAsc => "quantity_asc",
            Self::CustomerAsc => "customer_asc",
            Self::CustomerDesc => "customer_desc",
            Self::AmountDesc => "amount_desc",
            Self::AmountAsc => "amount_asc",
        }
    }
}

/// Immutable description of one browse request: free-text search, facet
/// membership sets, tag substrings, inclusive age/date bounds, sort key, and
/// pagination. Field names serialize in camelCase because the spec echoes the
/// applied filter back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub search: String,
    pub regions: Vec<String>,
    pub gender: Vec<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub age_min: Option<i64>,
    pub age_max: Option<i64>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub sort: SortKey,
    pub page: u64,
    pub limit: u64,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            regions: Vec::new(),
            gender: Vec::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            payment_methods: Vec::new(),
            age_min: None,
            age_max: None,
            date_start: None,
            date_end: None,
            sort: SortKey::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FilterSpec {
    /// Canonical form used for query compilation and for the echoed
    /// `filters` payload: trimmed search text, empty set members dropped,
    /// blank date bounds treated as absent, page clamped to >= 1, and a
    /// limit outside `[1, MAX_LIMIT]` replaced with the default. Out-of-range
    /// paging input is clamped, never rejected.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.search = out.search.trim().to_string();
        for set in [
            &mut out.regions,
            &mut out.gender,
            &mut out.categories,
            &mut out.tags,
            &mut out.payment_methods,
        ] {
            let cleaned: Vec<String> = set
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            *set = cleaned;
        }
        out.date_start = out.date_start.and_then(trimmed_opt);
        out.date_end = out.date_end.and_then(trimmed_opt);
        if out.page < 1 {
            out.page = DEFAULT_PAGE;
        }
        if out.limit < 1 || out.limit > MAX_LIMIT {
            out.limit = DEFAULT_LIMIT;
        }
        out
    }

    /// True when no clause-producing field is set; the predicate compiles to
    /// no WHERE clause at all and the page covers the whole table.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.search.trim().is_empty()
            && self.regions.is_empty()
            && self.gender.is_empty()
            && self.categories.is_empty()
            && self.tags.is_empty()
            && self.payment_methods.is_empty()
            && self.age_min.is_none()
            && self.age_max.is_none()
            && self.date_start.is_none()
            && self.date_end.is_none()
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

fn trimmed_opt(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_table_is_exact() {
        let table = [
            ("date_desc", "date", "DESC"),
            ("date_asc", "date", "ASC"),
            ("quantity_desc", "quantity", "DESC"),
            ("quantity_asc", "quantity", "ASC"),
            ("customer_asc", "customer_name", "ASC"),
            ("customer_desc", "customer_name", "DESC"),
            ("amount_desc", "final_amount", "DESC"),
            ("amount_asc", "final_amount", "ASC"),
        ];
        for (key, column, direction) in table {
            let parsed = SortKey::parse(key);
            assert_eq!(parsed.order(), (column, direction), "key {key}");
            assert_eq!(parsed.as_str(), key);
        }
    }

    #[test]
    fn unknown_sort_key_falls_back_to_date_desc() {
        assert_eq!(SortKey::parse("price_desc"), SortKey::DateDesc);
        assert_eq!(SortKey::parse(""), SortKey::DateDesc);
        assert_eq!(SortKey::parse("DATE_DESC"), SortKey::DateDesc);
    }

    #[test]
    fn normalization_trims_and_drops_empty_members() {
        let spec = FilterSpec {
            search: "  alice  ".to_string(),
            regions: vec!["North".to_string(), " ".to_string(), String::new()],
            date_start: Some("   ".to_string()),
            ..FilterSpec::default()
        };
        let normalized = spec.normalized();
        assert_eq!(normalized.search, "alice");
        assert_eq!(normalized.regions, vec!["North".to_string()]);
        assert_eq!(normalized.date_start, None);
    }

    #[test]
    fn paging_is_clamped_not_rejected() {
        let spec = FilterSpec {
            page: 0,
            limit: 1_000,
            ..FilterSpec::default()
        };
        let normalized = spec.normalized();
        assert_eq!(normalized.page, 1);
        assert_eq!(normalized.limit, DEFAULT_LIMIT);

        let spec = FilterSpec {
            page: 7,
            limit: 100,
            ..FilterSpec::default()
        };
        let normalized = spec.normalized();
        assert_eq!(normalized.page, 7);
        assert_eq!(normalized.limit, 100);
    }

    #[test]
    fn filter_echo_uses_camel_case_keys() {
        let value = serde_json::to_value(FilterSpec::default()).expect("serialize filter");
        let obj = value.as_object().expect("filter object");
        for key in [
            "search",
            "regions",
            "gender",
            "categories",
            "tags",
            "paymentMethods",
            "ageMin",
            "ageMax",
            "dateStart",
            "dateEnd",
            "sort",
            "page",
            "limit",
        ] {
            assert!(obj.contains_key(key), "missing echo key {key}");
        }
        assert_eq!(value["sort"], serde_json::json!("date_desc"));
    }
}
