use proptest::prelude::*;
use tilldeck_model::{page_count, FilterSpec, SortKey, DEFAULT_LIMIT, MAX_LIMIT};

proptest! {
    #[test]
    fn normalized_limit_is_always_in_range(limit in 0_u64..10_000) {
        let filter = FilterSpec { limit, ..FilterSpec::default() };
        let normalized = filter.normalized();
        prop_assert!(normalized.limit >= 1 && normalized.limit <= MAX_LIMIT);
        if (1..=MAX_LIMIT).contains(&limit) {
            prop_assert_eq!(normalized.limit, limit);
        } else {
            prop_assert_eq!(normalized.limit, DEFAULT_LIMIT);
        }
    }

    #[test]
    fn normalized_page_is_at_least_one(page in 0_u64..1_000_000) {
        let filter = FilterSpec { page, ..FilterSpec::default() };
        prop_assert!(filter.normalized().page >= 1);
    }

    #[test]
    fn normalization_is_idempotent(
        search in ".{0,40}",
        regions in proptest::collection::vec(".{0,12}", 0..6),
        page in 0_u64..500,
        limit in 0_u64..500,
    ) {
        let filter = FilterSpec { search, regions, page, limit, ..FilterSpec::default() };
        let once = filter.normalized();
        prop_assert_eq!(once.normalized(), once.clone());
    }

    #[test]
    fn page_count_bounds_hold(total in 0_u64..1_000_000, limit in 1_u64..=MAX_LIMIT) {
        let pages = page_count(total, limit);
        prop_assert!(pages * limit >= total);
        if total > 0 {
            prop_assert!((pages - 1) * limit < total);
        } else {
            prop_assert_eq!(pages, 0);
        }
    }

    #[test]
    fn sort_key_parse_never_panics(raw in ".{0,24}") {
        let _ = SortKey::parse(&raw);
    }
}
