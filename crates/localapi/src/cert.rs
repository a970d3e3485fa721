//! Certificate pair parsing.
//!
//! `/localapi/v0/cert/<domain>?type=pair` answers with a single PEM stream:
//! the private key block first, then the certificate chain.

use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::sign::CertifiedKey;

use crate::Error;

/// PEM key/cert pair for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertPair {
    /// PEM-encoded certificate chain, leaf first.
    pub cert_pem: Vec<u8>,
    /// PEM-encoded private key.
    pub key_pem: Vec<u8>,
}

const BOUNDARY: &[u8] = b"--\n--";

impl CertPair {
    /// Split a `?type=pair` body into key and certificate halves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCertPair`] if the body has no boundary between
    /// the key block and the first certificate block.
    pub fn from_pair_pem(pair: &[u8]) -> Result<Self, Error> {
        let i = pair
            .windows(BOUNDARY.len())
            .position(|w| w == BOUNDARY)
            .ok_or(Error::MalformedCertPair)?;
        let split = i + "--\n".len();
        Ok(Self {
            key_pem: pair[..split].to_vec(),
            cert_pem: pair[split..].to_vec(),
        })
    }

    /// Parse the pair into a rustls [`CertifiedKey`] backed by a ring signer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCertificate`] if either half fails to parse or
    /// the key type is not supported.
    pub fn into_certified_key(self, domain: &str) -> Result<Arc<CertifiedKey>, Error> {
        let invalid = |reason: String| Error::InvalidCertificate {
            domain: domain.to_owned(),
            reason,
        };

        let certs: Vec<CertificateDer<'static>> =
            rustls_pemfile::certs(&mut std::io::BufReader::new(self.cert_pem.as_slice()))
                .collect::<Result<_, _>>()
                .map_err(|e| invalid(format!("certificate chain: {e}")))?;
        if certs.is_empty() {
            return Err(invalid("no certificate in PEM data".into()));
        }

        let key = rustls_pemfile::private_key(&mut std::io::BufReader::new(self.key_pem.as_slice()))
            .map_err(|e| invalid(format!("private key: {e}")))?
            .ok_or_else(|| invalid("no private key in PEM data".into()))?;

        let signing_key = rustls::crypto::ring::sign::any_supported_type(&key)
            .map_err(|e| invalid(format!("private key: {e}")))?;

        Ok(Arc::new(CertifiedKey::new(certs, signing_key)))
    }
}
