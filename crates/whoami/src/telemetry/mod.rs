//! Structured logging setup.
//!
//! All log output goes to stderr as JSON, one event per line.
//!
//! # Logging invariants
//!
//! - Identity records are never logged in full; only the login and node name
//!   appear, at `debug`.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), and
//!   `RUST_LOG` takes precedence when set.

pub mod init;

pub use init::init_telemetry;
