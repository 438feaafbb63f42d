//! Verify the pure request/response helpers against JSON vectors in `test-vectors/`.
//!
//! Each vector file holds a `cases` array. Headers are compared as
//! name-to-value maps, so field order in the files does not matter.

use std::collections::BTreeMap;

use cmis_net::{
    BackendOptions, Headers, HeaderAccumulator, HttpMethod, QueryParams, RequestBuilder,
    RequestOptions,
};
use serde_json::Value;

fn load(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect()
}

fn header_map(headers: &Headers) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Request builder
// ---------------------------------------------------------------------------

#[test]
fn request_builder_vectors() {
    let vectors = load(include_str!("../../test-vectors/request_builder.json"));
    let builder = RequestBuilder::new(vectors["user_agent"].as_str().unwrap());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let params: QueryParams = serde_json::from_value(case["params"].clone()).unwrap();
        let extra: Option<Headers> = case["headers"]
            .as_object()
            .map(|_| string_map(&case["headers"]).into_iter().collect());

        let (url, headers) = builder
            .build(case["url"].as_str().unwrap(), &params, extra.as_ref())
            .unwrap();

        assert_eq!(url, case["expected_url"].as_str().unwrap(), "{name}: url");
        assert_eq!(header_map(&headers), string_map(&case["expected_headers"]), "{name}: headers");
    }
}

// ---------------------------------------------------------------------------
// Prepared requests
// ---------------------------------------------------------------------------

#[test]
fn prepare_vectors() {
    let vectors = load(include_str!("../../test-vectors/prepare.json"));
    let builder = RequestBuilder::new(vectors["user_agent"].as_str().unwrap());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());

        let request = builder
            .prepare(
                method,
                "http://x/obj",
                case["payload"].as_str().map(str::as_bytes),
                case["content_type"].as_str(),
                None,
                RequestOptions::new(),
                &BackendOptions::new(),
            )
            .unwrap();

        assert_eq!(request.method, method, "{name}: method");
        assert_eq!(
            request.headers.get("content-type"),
            case["expected_content_type"].as_str(),
            "{name}: content-type"
        );
        assert_eq!(
            request.payload.as_deref(),
            case["expected_payload"].as_str().map(str::as_bytes),
            "{name}: payload"
        );
        assert_eq!(request.headers.get("user-agent"), Some("cmislib/test"), "{name}: user-agent");
    }
}

// ---------------------------------------------------------------------------
// Header accumulation
// ---------------------------------------------------------------------------

#[test]
fn header_line_vectors() {
    let vectors = load(include_str!("../../test-vectors/header_lines.json"));

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut acc = HeaderAccumulator::new();
        for line in case["lines"].as_array().unwrap() {
            acc.record(line.as_str().unwrap().as_bytes());
        }
        assert_eq!(header_map(acc.headers()), string_map(&case["expected"]), "{name}");
    }
}
