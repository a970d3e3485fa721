//! Axum request handlers.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use super::state::AppState;

/// Value of `Access-Control-Allow-Methods`, and of `Allow` on a 405.
pub const ALLOWED_METHODS: &str = "GET, OPTIONS";

/// Preflight results may be cached for a day.
pub const MAX_AGE_SECS: &str = "86400";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// `GET|OPTIONS /whoami`: identity of the calling peer.
///
/// The `Origin` header must exactly match one of the allowed origins, for
/// every method. On a match the origin is echoed back with the CORS headers;
/// preflights end there with `204`. `GET` resolves the peer address through
/// the tailnet and returns the identity record as JSON.
///
/// The lookup future belongs to the request, so it is dropped with it when
/// the client goes away.
pub async fn whoami(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let origin_value = headers.get(header::ORIGIN);
    let origin = origin_value.and_then(|v| v.to_str().ok()).unwrap_or("");

    if state.allowed_origins.matching(origin).is_none() {
        debug!(origin, %remote, "origin not allowed");
        return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
    }

    let cors = cors_headers(
        origin_value
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("")),
    );

    if method == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, cors).into_response();
    }
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            cors,
            [(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
        )
            .into_response();
    }

    let who = match state.tailnet.who_is(remote).await {
        Ok(w) => w,
        Err(e) => {
            warn!(%remote, error = %e, "whois failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, cors, e.to_string()).into_response();
        }
    };
    debug!(
        %remote,
        login = who.login_name().unwrap_or_default(),
        node = who.node_name().unwrap_or_default(),
        "resolved caller"
    );

    let body = match serde_json::to_vec(&who) {
        Ok(b) => b,
        Err(e) => {
            error!(%remote, error = %e, "failed to serialise identity record");
            return (StatusCode::INTERNAL_SERVER_ERROR, cors, e.to_string()).into_response();
        }
    };

    (
        StatusCode::OK,
        cors,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        body,
    )
        .into_response()
}

/// CORS headers for an allowed `origin`, which is echoed rather than
/// replaced by a wildcard.
fn cors_headers(origin: HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers
}
