//! Multipart upload dispatcher.
//!
//! # Design
//! Uploads are a separate path from plain requests: extra parameters ride
//! as multipart text fields, never as JSON, and file bytes are streamed
//! from disk. Auth headers and the 401 session guard behave exactly as in
//! the plain dispatcher, and so does the failure discipline — transport
//! failures are `Err`, every HTTP status is `Ok(Envelope)`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use reqwest::header;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Url};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{Envelope, Method};
use crate::request;
use crate::session;

/// One local file selected for upload.
#[derive(Debug, Clone)]
pub struct FileAsset {
    pub uri: PathBuf,
    pub mime: String,
}

impl FileAsset {
    pub fn new(uri: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime: mime.into(),
        }
    }

    /// On-wire filename: the trailing segment of the local path.
    pub fn file_name(&self) -> String {
        self.uri
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string())
    }
}

impl ApiClient {
    /// Upload one or more files as a multipart request. With several files
    /// every part is named `{field}[]`; with one, plain `field`. Extra
    /// scalar parameters become additional multipart text fields.
    pub async fn upload(
        &self,
        path: &str,
        files: &[FileAsset],
        field: &str,
        method: Method,
        extra: &BTreeMap<String, String>,
    ) -> Result<Envelope, ApiError> {
        if !matches!(method, Method::Post | Method::Put | Method::Patch) {
            return Err(ApiError::InvalidParams(format!(
                "upload requires POST, PUT or PATCH, got {method}"
            )));
        }

        let public = session::is_public(path);
        let absolute = request::resolve_url(path, self.config.api_url());
        let url = Url::parse(&absolute).map_err(|_| ApiError::InvalidUrl(absolute.clone()))?;

        let part_name = if files.len() > 1 {
            format!("{field}[]")
        } else {
            field.to_string()
        };

        let mut form = Form::new();
        for asset in files {
            let file = File::open(&asset.uri).await.map_err(|e| {
                ApiError::FileIo(format!("failed to open {}: {e}", asset.uri.display()))
            })?;
            let part = Part::stream(Body::wrap_stream(ReaderStream::new(file)))
                .file_name(asset.file_name())
                .mime_str(&asset.mime)?;
            form = form.part(part_name.clone(), part);
        }

        for (key, value) in extra {
            form = form.text(key.clone(), value.clone());
        }

        let mut req = self
            .http
            .request(method.into(), url.clone())
            .header(header::ACCEPT, "application/json");

        if !public {
            if let Some(token) = self.tokens.load()? {
                req = req.bearer_auth(token);
            }
        }

        let response = req.multipart(form).send().await.map_err(|source| {
            ApiError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        self.finish(method, path, public, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_the_trailing_segment() {
        let asset = FileAsset::new("/data/user/0/pictures/cte.jpg", "image/jpeg");
        assert_eq!(asset.file_name(), "cte.jpg");
    }

    #[test]
    fn file_name_falls_back_for_bare_roots() {
        let asset = FileAsset::new("/", "image/jpeg");
        assert_eq!(asset.file_name(), "file");
    }
}
