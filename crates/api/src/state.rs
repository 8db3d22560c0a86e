//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Store;
use crate::middleware::TokenKey;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    tokens: TokenKey,
}

impl AppState {
    /// Create a new application state over `store`.
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn Store>) -> Self {
        let tokens = TokenKey::new(config.token_secret.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// The persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Bearer-token signer/verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenKey {
        &self.inner.tokens
    }
}
