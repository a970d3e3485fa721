//! Error type for local API calls.

use thiserror::Error;

/// Errors returned by [`crate::LocalClient`] and other [`crate::Tailnet`]
/// implementations.
///
/// The `Display` text is what callers of the whoami endpoint see in a `500`
/// body, so it stays short and free of internal paths where possible.
#[derive(Debug, Error)]
pub enum Error {
    /// The daemon's Unix socket could not be reached.
    #[error("failed to connect to local tailscaled: {0}")]
    Connect(String),

    /// The HTTP exchange over the socket failed mid-flight.
    #[error("local API request failed: {0}")]
    Http(String),

    /// The daemon answered with an unexpected status code.
    #[error("local API returned {status}: {message}")]
    Api {
        /// HTTP status code returned by the daemon.
        status: u16,
        /// Error message from the daemon's JSON body, or the raw body text.
        message: String,
    },

    /// `whois` found no node for the given address.
    #[error("peer not found")]
    PeerNotFound,

    /// A response body could not be decoded.
    #[error("failed to decode local API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The TLS ClientHello carried no SNI server name.
    #[error("no SNI ServerName")]
    MissingServerName,

    /// A `?type=pair` certificate body had no key/cert boundary.
    #[error("unexpected cert pair output: no delimiter")]
    MalformedCertPair,

    /// The certificate or key PEM could not be turned into a signing identity.
    #[error("invalid certificate for {domain}: {reason}")]
    InvalidCertificate {
        /// Domain the certificate was requested for.
        domain: String,
        /// What went wrong while parsing.
        reason: String,
    },

    /// A bounded local API call did not finish in time.
    #[error("timed out fetching certificate for {0}")]
    Timeout(String),
}
