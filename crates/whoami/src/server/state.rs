//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use localapi::Tailnet;

use crate::cors::AllowedOrigins;

/// Application state shared across all request handlers.
///
/// Both fields are `Arc`-wrapped so that Axum can clone the state for each
/// request without copying the allow-list or the client.
#[derive(Clone)]
pub struct AppState {
    /// Origins allowed to call `/whoami`. Immutable after startup.
    pub allowed_origins: Arc<AllowedOrigins>,
    /// Identity resolver and certificate source.
    pub tailnet: Arc<dyn Tailnet>,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(allowed_origins: AllowedOrigins, tailnet: Arc<dyn Tailnet>) -> Self {
        Self {
            allowed_origins: Arc::new(allowed_origins),
            tailnet,
        }
    }
}
