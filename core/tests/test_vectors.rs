//! Verify the request builder against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector describes a method, template and parameter set plus the
//! expected resolved URL, headers and body. Bodies are compared as parsed
//! JSON, not raw strings, to avoid false negatives from field ordering.

use logbook_core::request::{prepare, Params};
use logbook_core::Method;
use serde_json::Value;

fn parse_method(s: &str) -> Method {
    match s {
        "GET" => Method::Get,
        "HEAD" => Method::Head,
        "POST" => Method::Post,
        "PUT" => Method::Put,
        "PATCH" => Method::Patch,
        "DELETE" => Method::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn params_from(case: &Value) -> Params {
    let mut params = Params::new();

    if let Some(path) = case.get("path").and_then(Value::as_object) {
        for (key, value) in path {
            params = params.path(key, value.as_str().expect("path values are strings"));
        }
    }
    if let Some(fields) = case.get("fields").and_then(Value::as_object) {
        for (key, value) in fields {
            params = params.field(key, value.clone());
        }
    }
    if let Some(headers) = case.get("headers").and_then(Value::as_array) {
        for entry in headers {
            let pair = entry.as_array().expect("header entries are pairs");
            params = params.header(
                pair[0].as_str().expect("header name"),
                pair[1].as_str().expect("header value"),
            );
        }
    }

    params
}

#[test]
fn request_builder_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let template = case["template"].as_str().unwrap();
        let expected = &case["expected"];

        let req = prepare(method, template, params_from(case), base_url).unwrap();

        assert_eq!(
            req.url.as_str(),
            expected["url"].as_str().unwrap(),
            "{name}: url"
        );

        match expected.get("body") {
            Some(expected_body) => {
                let body: Value =
                    serde_json::from_str(req.body.as_deref().expect("body present")).unwrap();
                assert_eq!(&body, expected_body, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: unexpected body"),
        }

        if let Some(expected_headers) = expected.get("headers").and_then(Value::as_array) {
            let expected_headers: Vec<(String, String)> = expected_headers
                .iter()
                .map(|pair| {
                    let pair = pair.as_array().unwrap();
                    (
                        pair[0].as_str().unwrap().to_string(),
                        pair[1].as_str().unwrap().to_string(),
                    )
                })
                .collect();
            assert_eq!(req.headers, expected_headers, "{name}: headers");
        }
    }
}
