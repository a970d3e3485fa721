//! HTTPS server, routing, and the identity handler.
//!
//! # Responsibilities
//! - Accept TCP connections and terminate TLS with tailnet-issued certificates.
//! - Define the Axum router and the `/whoami` handler.
//! - Inject shared application state (`AppState`) into handlers.

pub mod handlers;
pub mod router;
pub mod serve;
pub mod state;
pub mod tls;
