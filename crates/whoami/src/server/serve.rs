//! HTTPS accept loop.
//!
//! For each incoming TCP connection the server:
//! 1. Completes a TLS handshake with a certificate fetched for its SNI name.
//! 2. Serves HTTP/1.1 or HTTP/2 on it, tagging every request with the peer
//!    address as [`ConnectInfo`] so handlers can resolve the caller.
//!
//! A failing connection is logged and dropped; it never stops the loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::ConnectInfo;
use axum::Router;
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use localapi::Tailnet;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tracing::{debug, error, info};

use super::tls;

/// Accept connections on `listener` until `shutdown` resolves.
///
/// On shutdown the listener is closed and every open connection is told to
/// finish its in-flight requests and close. Returns once all of them are gone.
///
/// # Errors
///
/// Currently never returns an error; accept failures are logged and retried.
pub async fn run(
    listener: TcpListener,
    router: Router,
    tailnet: Arc<dyn Tailnet>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(shutdown);
    let (stop_tx, stop_rx) = watch::channel(());
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((tcp, peer)) => {
                    debug!(%peer, "accepted TCP connection");
                    let router = router.clone();
                    let tailnet = Arc::clone(&tailnet);
                    let stop = stop_rx.clone();
                    connections.spawn(async move {
                        if let Err(e) = handle_connection(tcp, peer, router, tailnet, stop).await {
                            let error = format!("{e:#}");
                            debug!(%peer, %error, "connection closed with error");
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept error"),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = &mut shutdown => break,
        }
    }

    drop(listener);
    info!(
        open_connections = connections.len(),
        "shutdown signal received, draining open connections"
    );
    let _ = stop_tx.send(());
    while connections.join_next().await.is_some() {}
    info!("all connections closed");
    Ok(())
}

/// Terminate TLS on one connection and serve HTTP on it until the client
/// closes it or `stop` fires.
async fn handle_connection(
    tcp: TcpStream,
    peer: SocketAddr,
    router: Router,
    tailnet: Arc<dyn Tailnet>,
    mut stop: watch::Receiver<()>,
) -> Result<()> {
    let tls = tokio::select! {
        tls = tls::accept(tcp, tailnet.as_ref()) => tls?,
        _ = stop.changed() => return Ok(()),
    };

    let service = hyper::service::service_fn(move |mut req: Request<Incoming>| {
        req.extensions_mut().insert(ConnectInfo(peer));
        router.clone().oneshot(req)
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(tls), service);
    tokio::pin!(conn);

    let served = tokio::select! {
        served = conn.as_mut() => served,
        _ = stop.changed() => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };
    served.map_err(|e| anyhow::anyhow!("serving connection: {e}"))
}

/// Resolves when the process receives Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
