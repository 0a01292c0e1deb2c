//! Verify request building against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file lists inputs and the exact URI or body the builder must
//! produce for them.

use std::collections::BTreeMap;

use http_proxy::request::{build_request, merge_query};
use http_proxy::{ContentType, HttpMethod, Options};
use serde_json::Value;

fn parameters(case: &Value) -> BTreeMap<String, Value> {
    serde_json::from_value(case["parameters"].clone()).unwrap()
}

// ---------------------------------------------------------------------------
// GET query merging
// ---------------------------------------------------------------------------

#[test]
fn query_merge_vectors() {
    let raw = include_str!("../../test-vectors/query_merge.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let uri = case["uri"].as_str().unwrap();
        let params = parameters(case);

        let merged = merge_query(uri, &params).unwrap();
        assert_eq!(merged, case["expected"].as_str().unwrap(), "{name}: merged uri");

        // Merging the same parameters again must not change anything.
        assert_eq!(merge_query(&merged, &params).unwrap(), merged, "{name}: idempotent");

        let options = Options::builder()
            .uri(uri)
            .parameters(params)
            .build()
            .unwrap();
        let req = build_request(&options, HttpMethod::Get, "localhost").unwrap();
        assert_eq!(req.uri, merged, "{name}: request uri");
        assert!(req.body.is_none(), "{name}: no body");
    }
}

// ---------------------------------------------------------------------------
// POST bodies
// ---------------------------------------------------------------------------

#[test]
fn post_body_vectors() {
    let raw = include_str!("../../test-vectors/post_body.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let content_type: ContentType =
            serde_json::from_value(case["content_type"].clone()).unwrap();

        let options = Options::builder()
            .uri("http://example.com/api?keep=1")
            .content_type(content_type)
            .parameters(parameters(case))
            .build()
            .unwrap();
        let req = build_request(&options, HttpMethod::Post, "localhost").unwrap();

        assert_eq!(req.uri, "http://example.com/api?keep=1", "{name}: uri untouched");
        assert_eq!(
            req.header("Content-Type"),
            case["expected_content_type"].as_str(),
            "{name}: content type"
        );
        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert_eq!(body, case["expected_body"].as_str().unwrap(), "{name}: body");
    }
}
