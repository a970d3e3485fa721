//! Axum router construction.

use axum::{routing::any, Router};
use tower_http::trace::TraceLayer;

use super::{handlers, state::AppState};

/// Path of the identity endpoint.
pub const WHOAMI_PATH: &str = "/whoami";

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Every method is routed to the handler so the origin check runs before any
/// method check.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route(WHOAMI_PATH, any(handlers::whoami))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
