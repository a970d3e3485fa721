//! The capability the whoami server needs from the tailnet.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use rustls::sign::CertifiedKey;

use crate::protocol::{Status, WhoIs};
use crate::Error;

/// Identity lookup, certificate provisioning and self status.
///
/// [`crate::LocalClient`] implements this against the real daemon; tests
/// substitute fakes or (with the `mock` feature) `MockTailnet`.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait Tailnet: Send + Sync + 'static {
    /// Status of the local node.
    async fn status(&self) -> Result<Status, Error>;

    /// Identity of the node and user behind `remote`.
    async fn who_is(&self, remote: SocketAddr) -> Result<WhoIs, Error>;

    /// TLS certificate for the SNI `server_name` of an incoming handshake.
    async fn certificate(&self, server_name: &str) -> Result<Arc<CertifiedKey>, Error>;
}

