/// Property-based tests using proptest
/// Tests invariants of the sanitizer, the rate limiter and query building
use proptest::prelude::*;
use rust_leadgen_api::core::lead_parser::{parse_json_array, sanitize_model_output};
use rust_leadgen_api::core::models::ValidatedLeadRequest;
use rust_leadgen_api::core::rate_limit::{FixedWindowLimiter, RateLimiter, WINDOW};
use rust_leadgen_api::integrations::search_client::build_search_query;

// Property: Sanitization should never panic and never leave control characters
proptest! {
    #[test]
    fn sanitize_never_panics(raw in "\\PC*") {
        let _ = sanitize_model_output(&raw);
    }

    #[test]
    fn sanitize_removes_all_control_characters(raw in any::<String>()) {
        let cleaned = sanitize_model_output(&raw);
        let has_control = cleaned
            .chars()
            .any(|c| ('\u{0}'..='\u{1F}').contains(&c) || ('\u{7F}'..='\u{9F}').contains(&c));
        prop_assert!(!has_control);
    }

    #[test]
    fn sanitize_is_identity_on_compact_json_arrays(
        names in prop::collection::vec("[a-zA-Z ]{1,12}", 0..5)
    ) {
        let records: Vec<serde_json::Value> = names
            .iter()
            .map(|n| serde_json::json!({ "Name": n, "Email": "N/A" }))
            .collect();
        let raw = serde_json::to_string(&records).unwrap();
        prop_assert_eq!(sanitize_model_output(&raw), raw);
    }

    #[test]
    fn trailing_commas_do_not_break_parsing(
        values in prop::collection::vec(0i64..1000, 1..6),
        spaces in "[ \t\n]{0,3}"
    ) {
        let body = values
            .iter()
            .map(|v| format!("{{\"a\":{},{}}}", v, spaces))
            .collect::<Vec<_>>()
            .join(",");
        let raw = format!("[{},{}]", body, spaces);

        let parsed = parse_json_array(&raw).unwrap();
        prop_assert_eq!(parsed.len(), values.len());
        for (item, v) in parsed.iter().zip(values.iter()) {
            prop_assert_eq!(item["a"].as_i64(), Some(*v));
        }
    }
}

// Property: Within one window exactly the first N requests pass
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn limiter_allows_exactly_max_requests(max in 1u32..30, extra in 0u32..10) {
        let limiter = FixedWindowLimiter::with_limits(max, WINDOW);
        let allowed = (0..max + extra).filter(|_| limiter.allow("client")).count() as u32;
        prop_assert_eq!(allowed, max);
    }
}

// Property: Query terms never contain stray double quotes
proptest! {
    #[test]
    fn query_has_exactly_six_quotes(
        keyword in "[a-zA-Z\" ]{1,20}",
        site in "[a-z.]{3,15}",
        location in "[a-zA-Z,\" ]{1,20}",
        domain in "[a-z.@\"]{3,15}"
    ) {
        let request = ValidatedLeadRequest {
            keyword,
            site_address: site.clone(),
            location,
            email_domain: domain,
        };
        let query = build_search_query(&request);
        prop_assert_eq!(query.matches('"').count(), 6);
        let expected_prefix = format!("site:{} ", site);
        prop_assert!(query.starts_with(&expected_prefix));
    }
}
