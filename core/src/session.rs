//! Session state tracking and expiry notification.
//!
//! # Design
//! The session has two states, distinguished only by token presence. When
//! a protected request comes back 401 the guard clears the stored token and
//! broadcasts a `SessionExpired` event; the layer owning navigation decides
//! what to do with it. The network core never touches the UI.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::ApiError;
use crate::token::TokenStore;

/// Routes reachable without a bearer token.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "/v1/driver/signin",
    "/driver/code-request",
    "/driver/code-validation",
];

/// Protected routes whose 401 still clears the token but should not pull
/// the user back to the sign-in screen (background calls).
pub const NO_REDIRECT_ON_EXPIRY: &[&str] = &["/v1/driver/activate/push-receive-notifications"];

/// Whether a route template is in the unauthenticated allow-list. Matching
/// is on the template as written at the call site, before placeholder
/// substitution.
pub fn is_public(path: &str) -> bool {
    PUBLIC_ENDPOINTS.contains(&path)
}

pub fn is_redirect_exempt(path: &str) -> bool {
    NO_REDIRECT_ON_EXPIRY.contains(&path)
}

/// Notifications emitted by the client for the UI layer to consume.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A protected request came back 401; the stored token was cleared.
    SessionExpired { path: String },
    /// A non-2xx response carried a machine-readable error code.
    RequestFailed {
        code: String,
        message: Option<String>,
    },
}

/// Maps backend error codes to user-facing messages. The catalog content
/// lives outside this crate.
pub trait ErrorCatalog: Send + Sync {
    fn message_for(&self, code: &str) -> Option<String>;
}

pub(crate) struct SessionGuard {
    tokens: Arc<dyn TokenStore>,
    catalog: Option<Arc<dyn ErrorCatalog>>,
    events: broadcast::Sender<ClientEvent>,
}

impl SessionGuard {
    pub(crate) fn new(tokens: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            tokens,
            catalog: None,
            events,
        }
    }

    pub(crate) fn set_catalog(&mut self, catalog: Arc<dyn ErrorCatalog>) {
        self.catalog = Some(catalog);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Inspect one finished request. Clears the token and notifies on
    /// session expiry, and surfaces coded backend failures. Expiry
    /// supersedes coded-failure surfacing: a protected 401 never emits
    /// more than one event.
    pub(crate) fn inspect(
        &self,
        path: &str,
        public: bool,
        status: u16,
        data: &Value,
    ) -> Result<(), ApiError> {
        if status == 401 && !public {
            self.tokens.clear()?;
            tracing::warn!(path, "session expired, token cleared");
            if !is_redirect_exempt(path) {
                let _ = self.events.send(ClientEvent::SessionExpired {
                    path: path.to_string(),
                });
            }
            return Ok(());
        }

        if !(200..300).contains(&status) {
            if let Some(code) = data.get("code").and_then(Value::as_str) {
                let message = self.catalog.as_ref().and_then(|c| c.message_for(code));
                tracing::debug!(code, "request failed with coded error");
                let _ = self.events.send(ClientEvent::RequestFailed {
                    code: code.to_string(),
                    message,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    fn guard_with_store() -> (SessionGuard, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::with_token("abc"));
        (SessionGuard::new(store.clone()), store)
    }

    #[test]
    fn allow_list_matches_templates_exactly() {
        assert!(is_public("/v1/driver/signin"));
        assert!(is_public("/driver/code-request"));
        assert!(!is_public("/v1/driver/profile"));
        assert!(!is_public("/v1/driver/signin/extra"));
    }

    #[test]
    fn protected_401_clears_token_and_notifies_once() {
        let (guard, store) = guard_with_store();
        let mut events = guard.subscribe();

        // Even with a coded body, expiry is the only event.
        let data = serde_json::json!({ "code": "session_expired" });
        guard
            .inspect("/v1/driver/profile", false, 401, &data)
            .unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(matches!(
            events.try_recv().unwrap(),
            ClientEvent::SessionExpired { path } if path == "/v1/driver/profile"
        ));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn public_401_leaves_token_alone() {
        let (guard, store) = guard_with_store();
        let mut events = guard.subscribe();

        guard
            .inspect("/v1/driver/signin", true, 401, &Value::Null)
            .unwrap();

        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn redirect_exempt_401_clears_token_without_event() {
        let (guard, store) = guard_with_store();
        let mut events = guard.subscribe();

        let data = serde_json::json!({ "code": "session_expired" });
        guard
            .inspect(
                "/v1/driver/activate/push-receive-notifications",
                false,
                401,
                &data,
            )
            .unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn coded_failure_is_surfaced_with_catalog_message() {
        struct Catalog;
        impl ErrorCatalog for Catalog {
            fn message_for(&self, code: &str) -> Option<String> {
                (code == "invalid_credentials").then(|| "CPF ou senha inválidos".to_string())
            }
        }

        let (mut guard, _store) = guard_with_store();
        guard.set_catalog(Arc::new(Catalog));
        let mut events = guard.subscribe();

        let data = serde_json::json!({ "code": "invalid_credentials" });
        guard
            .inspect("/v1/driver/signin", true, 401, &data)
            .unwrap();

        match events.try_recv().unwrap() {
            ClientEvent::RequestFailed { code, message } => {
                assert_eq!(code, "invalid_credentials");
                assert_eq!(message.as_deref(), Some("CPF ou senha inválidos"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn success_emits_nothing() {
        let (guard, store) = guard_with_store();
        let mut events = guard.subscribe();

        guard
            .inspect("/v1/driver/profile", false, 200, &Value::Null)
            .unwrap();

        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        assert!(events.try_recv().is_err());
    }
}
