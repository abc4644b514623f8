// Transport configuration for building the reqwest::Client.
//
// Credentials and trust roots are handed to rustls straight from memory:
// nothing is staged on disk, so there is nothing to clean up when the
// client is dropped.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use secrecy::zeroize::Zeroizing;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::client::is_default_endpoint;
use crate::error::ConfigError;
use crate::material::CertificateChain;

/// User agent sent when the caller does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("nerves-hub-api/", env!("CARGO_PKG_VERSION"));

/// Where server certificates are anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchor {
    /// Root bundle compiled into the TLS stack (`webpki-roots`).
    /// Only valid for the public NervesHub endpoint.
    BuiltIn,
    /// Caller-supplied CA certificates. These become the only trust roots.
    Custom(CertificateChain),
}

impl TrustAnchor {
    /// Choose the trust anchor for `base_url`.
    ///
    /// An explicit CA always wins. Without one, the public endpoint falls
    /// back to the built-in bundle and any other endpoint is an error.
    pub fn resolve(base_url: &Url, ca_cert: Option<CertificateChain>) -> Result<Self, ConfigError> {
        match ca_cert {
            Some(chain) => Ok(Self::Custom(chain)),
            None if is_default_endpoint(base_url) => Ok(Self::BuiltIn),
            None => Err(ConfigError::TrustAnchorRequired {
                base_url: base_url.to_string(),
            }),
        }
    }
}

/// Settings for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub trust: TrustAnchor,
    /// Whole-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            trust: TrustAnchor::BuiltIn,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that authenticates with `credentials`.
    ///
    /// mTLS credentials become the TLS identity; a token becomes a
    /// sensitive `Authorization: Bearer` default header. Any material the
    /// TLS stack rejects is reported here, before a request is sent.
    pub fn build_client(&self, credentials: &Credentials) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(self.user_agent.as_str());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        match &self.trust {
            TrustAnchor::BuiltIn => {}
            TrustAnchor::Custom(chain) => {
                builder = builder.tls_built_in_root_certs(false);
                for der in chain.certificates() {
                    let cert = reqwest::Certificate::from_der(der.as_ref())
                        .map_err(|e| ConfigError::Tls(format!("invalid CA certificate: {e}")))?;
                    builder = builder.add_root_certificate(cert);
                }
            }
        }

        match credentials {
            Credentials::CertKey { cert, key } => {
                let mut bundle = Zeroizing::new(key.to_pem());
                bundle.extend_from_slice(&cert.to_pem());
                let identity = reqwest::Identity::from_pem(&bundle)
                    .map_err(|e| ConfigError::Tls(format!("invalid client identity: {e}")))?;
                builder = builder.identity(identity);
            }
            Credentials::Token(token) => {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                        .map_err(|_| ConfigError::InvalidToken)?;
                value.set_sensitive(true);
                let mut headers = HeaderMap::new();
                headers.insert(AUTHORIZATION, value);
                builder = builder.default_headers(headers);
            }
        }

        debug!(
            auth = ?credentials.kind(),
            custom_ca = matches!(self.trust, TrustAnchor::Custom(_)),
            "building HTTP client"
        );

        builder
            .build()
            .map_err(|e| ConfigError::Tls(format!("failed to build HTTP client: {e}")))
    }
}
