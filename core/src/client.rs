//! HTTP dispatcher for the driver API.
//!
//! # Design
//! `ApiClient` owns one `reqwest::Client`, the validated configuration and
//! an injected token store. Every call goes template → `prepare` →
//! execute → `Envelope`; the session guard inspects each finished response.
//! Transport-level failures (the request never reached HTTP) are the only
//! `Err` this module produces — every status code, 401 and 500 included,
//! comes back as `Ok(Envelope)` for the caller to branch on.
//!
//! No timeout, retry or de-duplication is applied here; requests run on the
//! transport's defaults and independent calls may overlap freely.

use std::sync::Arc;

use reqwest::header;
use tokio::sync::broadcast;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{self, Envelope, Method};
use crate::request::{self, Params};
use crate::session::{self, ClientEvent, ErrorCatalog, SessionGuard};
use crate::token::TokenStore;

pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ApiConfig,
    pub(crate) tokens: Arc<dyn TokenStore>,
    pub(crate) guard: SessionGuard,
}

impl ApiClient {
    pub fn new(config: ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        let guard = SessionGuard::new(tokens.clone());
        Ok(Self {
            http,
            config,
            tokens,
            guard,
        })
    }

    /// Attach an error catalog used to translate coded backend failures
    /// into user-facing messages on the event channel.
    pub fn with_error_catalog(mut self, catalog: Arc<dyn ErrorCatalog>) -> Self {
        self.guard.set_catalog(catalog);
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn token_store(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    /// Subscribe to session-expiry and coded-failure notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.guard.subscribe()
    }

    /// Execute one request described by `method`, a route template and a
    /// tagged parameter set.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<Envelope, ApiError> {
        let public = session::is_public(path);
        let prepared = request::prepare(method, path, params, self.config.api_url())?;
        let url = prepared.url.to_string();

        let mut req = self
            .http
            .request(prepared.method.into(), prepared.url.clone())
            .header(header::ACCEPT, "application/json");

        if !public {
            if let Some(token) = self.tokens.load()? {
                req = req.bearer_auth(token);
            }
        }

        for (name, value) in &prepared.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = prepared.body {
            tracing::debug!(%body, "request body");
            req = req.body(body);
        }

        let response = req
            .send()
            .await
            .map_err(|source| ApiError::Transport { url, source })?;

        self.finish(method, path, public, response).await
    }

    /// Common tail for plain and multipart requests: log, parse, run the
    /// session guard, wrap up the envelope.
    pub(crate) async fn finish(
        &self,
        method: Method,
        path: &str,
        public: bool,
        response: reqwest::Response,
    ) -> Result<Envelope, ApiError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        tracing::info!(%method, %url, status, "api response");

        let text = response
            .text()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        tracing::debug!(body = %text, "response body");

        let data = http::parse_body(&text);
        self.guard.inspect(path, public, status, &data)?;

        Ok(Envelope { data, status, url })
    }

    pub async fn get(&self, path: &str, params: Params) -> Result<Envelope, ApiError> {
        self.send(Method::Get, path, params).await
    }

    pub async fn head(&self, path: &str, params: Params) -> Result<Envelope, ApiError> {
        self.send(Method::Head, path, params).await
    }

    pub async fn post(&self, path: &str, params: Params) -> Result<Envelope, ApiError> {
        self.send(Method::Post, path, params).await
    }

    pub async fn put(&self, path: &str, params: Params) -> Result<Envelope, ApiError> {
        self.send(Method::Put, path, params).await
    }

    pub async fn patch(&self, path: &str, params: Params) -> Result<Envelope, ApiError> {
        self.send(Method::Patch, path, params).await
    }

    pub async fn delete(&self, path: &str, params: Params) -> Result<Envelope, ApiError> {
        self.send(Method::Delete, path, params).await
    }
}
