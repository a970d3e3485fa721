//! [`LocalClient`]: HTTP/1.1 client for the daemon's local API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{Request, StatusCode, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::sign::CertifiedKey;
use tracing::debug;

use crate::cert::CertPair;
use crate::connector::UnixConnector;
use crate::protocol::{ErrorBody, Status, WhoIs};
use crate::{Error, Tailnet};

/// Default location of the daemon's socket on Linux.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/tailscale/tailscaled.sock";

/// Authority the daemon expects in the `Host` header of local API requests.
const LOCAL_API_HOST: &str = "local-tailscaled.sock";

/// Capability version advertised in `Tailscale-Cap`.
const CAPABILITY_VERSION: &str = "106";

/// Upper bound on fetching a certificate during a TLS handshake.
pub const CERT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the local API, cheap to clone.
#[derive(Clone, Debug)]
pub struct LocalClient {
    http: Client<UnixConnector, Empty<Bytes>>,
}

impl LocalClient {
    /// Create a client for the socket at `socket`. No connection is made until
    /// the first request.
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        let http = Client::builder(TokioExecutor::new()).build(UnixConnector::new(socket));
        Self { http }
    }

    /// `GET /localapi/v0/status`.
    pub async fn status(&self) -> Result<Status, Error> {
        let body = self.get200("/localapi/v0/status").await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /localapi/v0/whois?addr=<remote>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PeerNotFound`] if the daemon knows no node at `remote`.
    pub async fn who_is(&self, remote: SocketAddr) -> Result<WhoIs, Error> {
        let addr: String = url::form_urlencoded::byte_serialize(remote.to_string().as_bytes()).collect();
        let body = match self.get200(&format!("/localapi/v0/whois?addr={addr}")).await {
            Err(Error::Api { status: 404, .. }) => return Err(Error::PeerNotFound),
            other => other?,
        };
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /localapi/v0/cert/<domain>?type=pair`.
    pub async fn cert_pair(&self, domain: &str) -> Result<CertPair, Error> {
        let body = self
            .get200(&format!("/localapi/v0/cert/{domain}?type=pair"))
            .await?;
        CertPair::from_pair_pem(&body)
    }

    /// Expand a bare host name (no dots) to the first cert domain that starts
    /// with `name.`.
    ///
    /// Returns `None` if `name` already contains a dot, no domain matches, or
    /// the status query fails.
    pub async fn expand_sni_name(&self, name: &str) -> Option<String> {
        if name.contains('.') {
            return None;
        }
        let status = match self.status().await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, name, "status lookup for SNI expansion failed");
                return None;
            }
        };
        expand_in(name, status.cert_domains())
    }

    /// Resolve the certificate for a handshake's SNI `server_name`.
    ///
    /// Bare names are expanded with [`Self::expand_sni_name`]. The whole
    /// lookup is bounded by [`CERT_TIMEOUT`].
    pub async fn certificate(&self, server_name: &str) -> Result<Arc<CertifiedKey>, Error> {
        if server_name.is_empty() {
            return Err(Error::MissingServerName);
        }

        tokio::time::timeout(CERT_TIMEOUT, async {
            let domain = match self.expand_sni_name(server_name).await {
                Some(expanded) => expanded,
                None => server_name.to_owned(),
            };
            let pair = self.cert_pair(&domain).await?;
            pair.into_certified_key(&domain)
        })
        .await
        .map_err(|_| Error::Timeout(server_name.to_owned()))?
    }

    /// Issue a GET and return the body, or an error if the status is not 200.
    async fn get200(&self, path_and_query: &str) -> Result<Bytes, Error> {
        let uri: Uri = format!("http://{LOCAL_API_HOST}{path_and_query}")
            .parse()
            .map_err(|e| Error::Http(format!("invalid local API path {path_and_query:?}: {e}")))?;

        let req = Request::get(uri)
            .header("Tailscale-Cap", CAPABILITY_VERSION)
            .body(Empty::<Bytes>::new())
            .map_err(|e| Error::Http(e.to_string()))?;

        let resp = self.http.request(req).await.map_err(|e| {
            let detail = std::error::Error::source(&e)
                .map(ToString::to_string)
                .unwrap_or_else(|| e.to_string());
            if e.is_connect() {
                Error::Connect(detail)
            } else {
                Error::Http(detail)
            }
        })?;

        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::Http(e.to_string()))?
            .to_bytes();

        if status != StatusCode::OK {
            return Err(api_error(status, &body));
        }
        Ok(body)
    }
}

#[async_trait]
impl Tailnet for LocalClient {
    async fn status(&self) -> Result<Status, Error> {
        LocalClient::status(self).await
    }

    async fn who_is(&self, remote: SocketAddr) -> Result<WhoIs, Error> {
        LocalClient::who_is(self, remote).await
    }

    async fn certificate(&self, server_name: &str) -> Result<Arc<CertifiedKey>, Error> {
        LocalClient::certificate(self, server_name).await
    }
}

/// First cert domain that extends `name` by at least one label.
fn expand_in(name: &str, cert_domains: &[String]) -> Option<String> {
    let prefix = format!("{name}.");
    cert_domains
        .iter()
        .find(|d| d.starts_with(&prefix))
        .cloned()
}

/// Build an [`Error::Api`] from a non-200 response, preferring the daemon's
/// `{"error": "..."}` message over the raw body.
fn api_error(status: StatusCode, body: &[u8]) -> Error {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(b) => b.error,
        Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
    };
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use hyper_util::rt::TokioIo;
    use hyper_util::service::TowerToHyperService;
    use serde_json::json;
    use tokio::net::UnixListener;

    const PAIR: &[u8] = include_bytes!("../testdata/pair.pem");
    const PEER: &str = "100.101.102.103:41234";

    async fn status() -> Json<serde_json::Value> {
        Json(json!({
            "BackendState": "Running",
            "Self": {"DNSName": "server.example.ts.net.", "HostName": "server"},
            "CertDomains": ["server.example.ts.net"]
        }))
    }

    async fn whois(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
        if headers.get("host").and_then(|h| h.to_str().ok()) != Some(LOCAL_API_HOST) {
            return (AxumStatus::FORBIDDEN, "invalid host").into_response();
        }
        match q.get("addr").map(String::as_str) {
            Some(PEER) => Json(json!({
                "Node": {"Name": "laptop.example.ts.net."},
                "UserProfile": {"LoginName": "alice@example.com"}
            }))
            .into_response(),
            _ => (AxumStatus::NOT_FOUND, Json(json!({"error": "no match for IP:port"})))
                .into_response(),
        }
    }

    async fn cert(Path(domain): Path<String>, Query(q): Query<HashMap<String, String>>) -> Response {
        if q.get("type").map(String::as_str) != Some("pair") {
            return (AxumStatus::BAD_REQUEST, "want type=pair").into_response();
        }
        if domain != "server.example.ts.net" {
            return (
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("invalid domain {domain:?}")})),
            )
                .into_response();
        }
        PAIR.to_vec().into_response()
    }

    /// Serve a fake daemon on a fresh Unix socket and return a client for it.
    async fn fake_daemon(name: &str) -> LocalClient {
        let path = std::env::temp_dir().join(format!(
            "localapi-{}-{name}.sock",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();

        let app = Router::new()
            .route("/localapi/v0/status", get(status))
            .route("/localapi/v0/whois", get(whois))
            .route("/localapi/v0/cert/:domain", get(cert));

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let svc = TowerToHyperService::new(app.clone());
                tokio::spawn(async move {
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        LocalClient::new(path)
    }

    #[tokio::test]
    async fn status_reads_self_dns_name() {
        let client = fake_daemon("status").await;
        let st = client.status().await.unwrap();
        assert_eq!(st.self_dns_name(), "server.example.ts.net");
    }

    #[tokio::test]
    async fn who_is_known_peer() {
        let client = fake_daemon("whois-known").await;
        let w = client.who_is(PEER.parse().unwrap()).await.unwrap();
        assert_eq!(w.login_name(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn who_is_unknown_peer_maps_404() {
        let client = fake_daemon("whois-unknown").await;
        let err = client.who_is("100.64.0.9:1".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::PeerNotFound), "got {err:?}");
    }

    #[tokio::test]
    async fn who_is_ipv6_peer_is_query_encoded() {
        let client = fake_daemon("whois-v6").await;
        // Unknown to the fake, but the request must still reach it intact.
        let err = client
            .who_is("[fd7a:115c:a1e0::1]:443".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PeerNotFound), "got {err:?}");
    }

    #[tokio::test]
    async fn certificate_expands_bare_sni_name() {
        let client = fake_daemon("cert-expand").await;
        let key = client.certificate("server").await.unwrap();
        assert_eq!(key.cert.len(), 1);
    }

    #[tokio::test]
    async fn certificate_surfaces_daemon_error_message() {
        let client = fake_daemon("cert-error").await;
        let err = client.certificate("other.example.ts.net").await.unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("invalid domain"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn certificate_requires_server_name() {
        let client = LocalClient::new("/nonexistent/tailscaled.sock");
        let err = client.certificate("").await.unwrap_err();
        assert!(matches!(err, Error::MissingServerName));
    }

    #[tokio::test]
    async fn missing_socket_is_a_connect_error() {
        let client = LocalClient::new("/nonexistent/tailscaled.sock");
        let err = client.status().await.unwrap_err();
        assert!(matches!(err, Error::Connect(_)), "got {err:?}");
    }

    #[test]
    fn expand_in_matches_label_prefix_only() {
        let domains = vec!["server.example.ts.net".to_string(), "serverless.example.ts.net".to_string()];
        assert_eq!(expand_in("server", &domains).as_deref(), Some("server.example.ts.net"));
        assert_eq!(expand_in("serv", &domains), None);
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let e = api_error(StatusCode::FORBIDDEN, b"access denied\n");
        assert_eq!(e.to_string(), "local API returned 403: access denied");
    }

    #[test]
    fn api_error_prefers_json_message() {
        let e = api_error(StatusCode::NOT_FOUND, br#"{"error":"no match for IP:port"}"#);
        assert_eq!(e.to_string(), "local API returned 404: no match for IP:port");
    }
}
