//! Certificate pinning for robots serving self-signed certificates.
//!
//! A [`PinnedCertificate`] is plugged into both transports at client
//! construction time: the REST client trusts it as an additional root, and
//! the WebSocket client builds its TLS connector from it. Session logic never
//! inspects certificates itself.

use native_tls::TlsConnector;
use thiserror::Error;

/// A certificate the client will trust in addition to the system roots.
#[derive(Clone, Debug)]
pub struct PinnedCertificate {
    der: Vec<u8>,
    accept_invalid_hostnames: bool,
}

impl PinnedCertificate {
    /// Pins a DER-encoded certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self {
            der: der.into(),
            accept_invalid_hostnames: false,
        }
    }

    /// Also accept hostnames the pinned certificate was not issued for.
    ///
    /// Robots are frequently reached by IP address or a local alias that the
    /// certificate does not name.
    pub fn accept_invalid_hostnames(mut self, accept: bool) -> Self {
        self.accept_invalid_hostnames = accept;
        self
    }

    pub(crate) fn reqwest_certificate(&self) -> Result<reqwest::Certificate, TlsError> {
        reqwest::Certificate::from_der(&self.der).map_err(TlsError::Certificate)
    }

    pub(crate) fn hostname_check_disabled(&self) -> bool {
        self.accept_invalid_hostnames
    }

    pub(crate) fn tls_connector(&self) -> Result<TlsConnector, TlsError> {
        let certificate =
            native_tls::Certificate::from_der(&self.der).map_err(TlsError::Connector)?;
        TlsConnector::builder()
            .add_root_certificate(certificate)
            .danger_accept_invalid_hostnames(self.accept_invalid_hostnames)
            .build()
            .map_err(TlsError::Connector)
    }
}

/// Errors raised while applying a pinned certificate to a transport.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The certificate could not be parsed for the HTTP client.
    #[error("invalid pinned certificate: {0}")]
    Certificate(#[source] reqwest::Error),

    /// The TLS connector for the WebSocket transport could not be built.
    #[error("tls connector setup failed: {0}")]
    Connector(#[source] native_tls::Error),
}
