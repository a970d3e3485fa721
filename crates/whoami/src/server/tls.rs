//! TLS termination with certificates fetched from the tailnet per handshake.
//!
//! There is no certificate on disk. The ClientHello is read first, its SNI
//! server name is handed to [`Tailnet::certificate`], and the handshake is
//! finished with a `rustls::ServerConfig` built around the returned key.

use std::sync::Arc;

use anyhow::{Context, Result};
use localapi::Tailnet;
use rustls::server::{Acceptor, ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use rustls::ServerConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::server::TlsStream;
use tokio_rustls::LazyConfigAcceptor;

/// Resolver that always presents the same certificate.
#[derive(Debug)]
struct FixedCert(Arc<CertifiedKey>);

impl ResolvesServerCert for FixedCert {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(Arc::clone(&self.0))
    }
}

/// Build a [`rustls::ServerConfig`] presenting `key`, offering HTTP/2 and
/// HTTP/1.1 over ALPN.
///
/// # Errors
///
/// Returns an error if rustls rejects the protocol configuration.
pub fn build_server_config(key: Arc<CertifiedKey>) -> Result<Arc<ServerConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .context("failed to select TLS protocol versions")?
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(FixedCert(key)));
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}

/// Run the server side of a TLS handshake on `io`.
///
/// # Errors
///
/// Returns an error if the ClientHello cannot be read, no certificate can be
/// obtained for its server name, or the handshake fails.
pub async fn accept<IO>(io: IO, tailnet: &dyn Tailnet) -> Result<TlsStream<IO>>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let start = LazyConfigAcceptor::new(Acceptor::default(), io)
        .await
        .context("failed to read TLS ClientHello")?;

    let server_name = start
        .client_hello()
        .server_name()
        .unwrap_or_default()
        .to_owned();

    let key = tailnet
        .certificate(&server_name)
        .await
        .with_context(|| format!("no certificate for {server_name:?}"))?;

    start
        .into_stream(build_server_config(key)?)
        .await
        .context("TLS handshake failed")
}
