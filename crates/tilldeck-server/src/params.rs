// SPDX-License-Identifier: Apache-2.0

use crate::config::ApiConfig;
use std::collections::HashMap;
use tilldeck_model::{FilterSpec, SortKey, DEFAULT_LIMIT, DEFAULT_PAGE};

/// Builds a normalized [`FilterSpec`] from raw query parameters. This never
/// fails: malformed numeric input, unknown sort keys, and out-of-range
/// paging are normalized to absent/default/clamped values instead of
/// rejecting the request.
#[must_use]
pub fn parse_sales_filter(params: &HashMap<String, String>) -> FilterSpec {
    FilterSpec {
        search: params.get("search").cloned().unwrap_or_default(),
        regions: split_csv(params.get("regions")),
        gender: split_csv(params.get("gender")),
        categories: split_csv(params.get("categories")),
        tags: split_csv(params.get("tags")),
        payment_methods: split_csv(params.get("paymentMethods")),
        age_min: parse_i64(params.get("ageMin")),
        age_max: parse_i64(params.get("ageMax")),
        date_start: non_empty(params.get("dateStart")),
        date_end: non_empty(params.get("dateEnd")),
        sort: params
            .get("sort")
            .map_or_else(SortKey::default, |raw| SortKey::parse(raw)),
        page: parse_u64(params.get("page")).unwrap_or(DEFAULT_PAGE),
        limit: parse_u64(params.get("limit")).unwrap_or(DEFAULT_LIMIT),
    }
    .normalized()
}

/// Sample-endpoint limit: unparseable input falls back to the default, and
/// the result is clamped into `[1, max_sample_limit]`.
#[must_use]
pub fn parse_sample_limit(params: &HashMap<String, String>, api: &ApiConfig) -> u64 {
    parse_u64(params.get("limit"))
        .unwrap_or(api.default_sample_limit)
        .clamp(1, api.max_sample_limit)
}

fn split_csv(raw: Option<&String>) -> Vec<String> {
    raw.map(|joined| {
        joined
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_i64(raw: Option<&String>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
}

fn parse_u64(raw: Option<&String>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
}

fn non_empty(raw: Option<&String>) -> Option<String> {
    raw.map(|v| v.trim()).filter(|v| !v.is_empty()).map(ToString::to_string)
}
