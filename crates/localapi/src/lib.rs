//! Client for the tailnet daemon's local HTTP API.
//!
//! The daemon (`tailscaled`) serves a small HTTP API on a Unix socket. This
//! crate speaks the three calls the whoami service needs: self status, peer
//! identity lookup (`whois`) and TLS certificate pairs.

pub mod cert;
pub mod client;
pub mod connector;
pub mod error;
pub mod protocol;
pub mod tailnet;

pub use cert::CertPair;
pub use client::{LocalClient, DEFAULT_SOCKET_PATH};
pub use error::Error;
pub use protocol::{Status, WhoIs};
pub use tailnet::Tailnet;

#[cfg(feature = "mock")]
pub use tailnet::MockTailnet;
