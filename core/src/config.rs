//! Client configuration: application name and API base URL.

use reqwest::Url;

use crate::error::ApiError;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "LOGBOOK_API_URL";
/// Environment variable overriding the application name.
pub const ENV_APP_NAME: &str = "LOGBOOK_APP_NAME";

const DEFAULT_APP_NAME: &str = "logbook";

/// Validated configuration for an [`crate::ApiClient`].
///
/// The base URL is checked once at construction so every later request can
/// assume a well-formed prefix. A trailing `/` is stripped since route
/// templates always start with one.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    app_name: String,
    api_url: String,
}

impl ApiConfig {
    pub fn new(app_name: impl Into<String>, api_url: impl Into<String>) -> Result<Self, ApiError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Url::parse(&api_url).map_err(|_| ApiError::InvalidBaseUrl(api_url.clone()))?;
        Ok(Self {
            app_name: app_name.into(),
            api_url,
        })
    }

    /// Read the configuration from the environment. `LOGBOOK_API_URL` is
    /// required; the app name falls back to `logbook`.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_url = std::env::var(ENV_API_URL).map_err(|_| ApiError::MissingEnv(ENV_API_URL))?;
        let app_name =
            std::env::var(ENV_APP_NAME).unwrap_or_else(|_| DEFAULT_APP_NAME.to_string());
        Self::new(app_name, api_url)
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Namespaced key under which the session token is persisted.
    pub fn token_key(&self) -> String {
        format!("@{}_token", self.app_name)
    }
}
