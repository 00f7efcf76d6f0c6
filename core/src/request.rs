//! Request builder: turns a route template plus a parameter description
//! into a fully-resolved `PreparedRequest`.
//!
//! # Design
//! Parameters are tagged at the call site — path substitutions, payload
//! fields and header overrides are separate maps rather than one bag whose
//! meaning is guessed at runtime. Payload fields travel as a query string
//! for GET/HEAD and as a JSON body for every other verb. The builder does
//! no I/O.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::{Method, PreparedRequest};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern"));

// Day, month, four-digit year, `/` or `-` separated. Kept byte-for-byte
// compatible with the backend's legacy expectations: single-digit day and
// month are allowed and are not zero-padded on rewrite.
static LEGACY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0?[1-9]|[12][0-9]|3[01])[/-](0?[1-9]|1[012])[/-](\d{4})$")
        .expect("legacy date pattern")
});

/// Tagged parameter description for one request.
///
/// `path` entries substitute `:name` placeholders in the route template,
/// `fields` become the query string or JSON body, and `headers` override
/// anything the builder set on its own.
#[derive(Debug, Clone, Default)]
pub struct Params {
    pub path: BTreeMap<String, String>,
    pub fields: Map<String, Value>,
    pub headers: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, key: &str, value: impl ToString) -> Self {
        self.path.insert(key.to_string(), value.to_string());
        self
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Build the field map from a serializable payload. The payload must
    /// serialize to a JSON object.
    pub fn body<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self {
                fields,
                ..Self::default()
            }),
            other => Err(ApiError::InvalidParams(format!(
                "request payload must be a JSON object, got {other}"
            ))),
        }
    }
}

/// Resolve a route template against the base URL unless it is already
/// absolute.
pub(crate) fn resolve_url(path: &str, base_url: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{base_url}{path}")
    }
}

/// Build one request: substitute placeholders, normalize fields, and place
/// them in the query string or the JSON body depending on the verb.
pub fn prepare(
    method: Method,
    template: &str,
    params: Params,
    base_url: &str,
) -> Result<PreparedRequest, ApiError> {
    let Params {
        path,
        mut fields,
        headers,
    } = params;

    // Placeholders resolve left to right; one with no matching entry is
    // left verbatim, as the backend's 404 is more useful than a local guess.
    let resolved = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        path.get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });

    normalize_fields(&mut fields);

    let absolute = resolve_url(&resolved, base_url);

    let (url, body, mut merged) = if method.takes_body() {
        let url =
            Url::parse(&absolute).map_err(|_| ApiError::InvalidUrl(absolute.clone()))?;
        let body = serde_json::to_string(&fields)?;
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        (url, Some(body), headers)
    } else {
        let pairs = query_pairs(&fields);
        let url = if pairs.is_empty() {
            Url::parse(&absolute)
        } else {
            Url::parse_with_params(&absolute, &pairs)
        }
        .map_err(|_| ApiError::InvalidUrl(absolute.clone()))?;
        (url, None, Vec::new())
    };

    for (name, value) in headers {
        match merged
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => merged.push((name, value)),
        }
    }

    Ok(PreparedRequest {
        method,
        url,
        headers: merged,
        body,
    })
}

/// Drop null fields and apply the legacy `data_*` date rewrite.
fn normalize_fields(fields: &mut Map<String, Value>) {
    fields.retain(|_, value| !value.is_null());

    for (key, value) in fields.iter_mut() {
        if !key.starts_with("data_") {
            continue;
        }
        let rewritten = match value {
            Value::String(text) => LEGACY_DATE
                .captures(text)
                .map(|caps| format!("{}-{}-{}", &caps[3], &caps[2], &caps[1])),
            _ => None,
        };
        if let Some(rewritten) = rewritten {
            *value = Value::String(rewritten);
        }
    }
}

/// Flatten the field map into query pairs. The map iterates in key order,
/// which keeps the encoding deterministic; array values expand to repeated
/// `key[]` pairs.
fn query_pairs(fields: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    if item.is_null() {
                        continue;
                    }
                    pairs.push((format!("{key}[]"), scalar(item)));
                }
            }
            other => pairs.push((key.clone(), scalar(other))),
        }
    }
    pairs
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
