//! Error types for the driver API client.
//!
//! # Design
//! Ordinary HTTP outcomes are not errors: `send`/`upload` hand back an
//! `Envelope` for every status code and callers branch on `status`. The
//! variants here cover everything else — transport-level failures, bad
//! configuration, storage problems, and the typed operations' "the server
//! answered something I did not expect" cases.

use std::collections::BTreeMap;

/// Errors returned by the client, the token stores and the typed
/// driver operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured API base URL does not parse.
    #[error("invalid API base URL `{0}`")]
    InvalidBaseUrl(String),

    /// A resolved request URL does not parse.
    #[error("could not resolve request URL `{0}`")]
    InvalidUrl(String),

    /// A required environment variable is missing.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// The request never produced an HTTP response (DNS, connection,
    /// refused socket). Uniform for plain requests and uploads.
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client construction or request assembly failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token store could not be read or written.
    #[error("token storage failed: {0}")]
    TokenStorage(String),

    /// A local file handed to the upload dispatcher could not be opened.
    #[error("file I/O error: {0}")]
    FileIo(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A response body could not be decoded into the expected type.
    #[error("response decoding failed: {0}")]
    Deserialization(String),

    /// A request description was malformed at the call site.
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),

    /// A typed operation received a status it does not accept.
    #[error("unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// The server rejected the submitted fields with a 422 error map.
    #[error("the server rejected the submitted fields")]
    Validation { errors: BTreeMap<String, String> },
}
