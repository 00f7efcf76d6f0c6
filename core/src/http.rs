//! Wire-level types shared by the dispatcher and the request builder.
//!
//! # Design
//! A request is first described as plain data (`PreparedRequest`) by the
//! builder, then executed by the dispatcher. Keeping the description inert
//! makes the builder fully deterministic and testable without a network.
//! Every executed request — whatever its status — collapses into the same
//! `Envelope` shape for callers to branch on.

use std::fmt;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// HTTP verb accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// GET and HEAD carry their fields as a query string; every other verb
    /// carries them as a JSON body.
    pub fn takes_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One fully-resolved request, ready for execution.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// The uniform result of every executed request.
///
/// `data` holds the parsed JSON body (an empty object when the body was
/// empty or unparseable), `status` the HTTP status, and `url` the final
/// URL the transport reported.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub data: Value,
    pub status: u16,
    pub url: String,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode `data` into a concrete response type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

/// Parse a response body, degrading to an empty object rather than failing.
pub(crate) fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Map::new()))
}
