//! Token persistence.
//!
//! # Design
//! The session token is a single opaque string. Absence is the logged-out
//! state, never an error. Stores are injected into the client as
//! `Arc<dyn TokenStore>` so nothing in the core reads ambient global state.
//! Reads and writes are independent operations with no cross-process
//! locking; the last write wins, and an in-flight request that already read
//! a stale token is expected to fail with 401 and be cleaned up then.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Durable storage for the single session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, ApiError>;
    fn save(&self, token: &str) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

/// Token store backed by one file in the platform config directory.
///
/// The file is named after the namespaced token key (`@{app_name}_token`),
/// mirroring the key-value entry the mobile client kept.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let dir = directories::ProjectDirs::from("br", "titon", config.app_name())
            .ok_or_else(|| {
                ApiError::TokenStorage("could not determine config directory".to_string())
            })?
            .config_dir()
            .to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| ApiError::TokenStorage(format!("failed to create config dir: {e}")))?;
        Ok(Self {
            path: dir.join(config.token_key()),
        })
    }

    /// Store the token under an explicit path instead of the platform
    /// config directory.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        match fs::read_to_string(&self.path) {
            Ok(token) => Ok(Some(token)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::TokenStorage(format!(
                "failed to read token: {e}"
            ))),
        }
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        fs::write(&self.path, token)
            .map_err(|e| ApiError::TokenStorage(format!("failed to write token: {e}")))
    }

    fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::TokenStorage(format!(
                "failed to remove token: {e}"
            ))),
        }
    }
}

/// In-memory token store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        Ok(self.token.read().unwrap().clone())
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        *self.token.write().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.token.write().unwrap() = None;
        Ok(())
    }
}
