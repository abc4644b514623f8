// NervesHub HTTP client
//
// Wraps `reqwest::Client` with org/product-scoped path construction and
// status-to-error mapping. Endpoint methods live in `devices.rs` as
// inherent methods so this module stays focused on transport mechanics.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::{ConfigError, Error};
use crate::material::CertificateChain;
use crate::models::ErrorResponse;
use crate::transport::{DEFAULT_USER_AGENT, TransportConfig, TrustAnchor};

/// The public NervesHub API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.nerves-hub.org";

const DEFAULT_HOST: &str = "api.nerves-hub.org";

/// Whether `url` points at the public NervesHub endpoint.
pub(crate) fn is_default_endpoint(url: &Url) -> bool {
    url.scheme() == "https"
        && url.host_str() == Some(DEFAULT_HOST)
        && url.port_or_known_default() == Some(443)
        && url.path().trim_end_matches('/').is_empty()
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.into(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.into(),
            reason: "expected an http(s) URL".into(),
        });
    }
    Ok(url)
}

// ── Configuration ────────────────────────────────────────────────────

/// Everything needed to construct a [`NervesHubClient`].
#[derive(Debug)]
pub struct ClientConfig {
    pub organization: String,
    pub product: String,
    pub credentials: Credentials,
    /// Defaults to [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,
    /// CA certificates for the server. Required unless `base_url` is the default.
    pub ca_cert: Option<CertificateChain>,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new(
        organization: impl Into<String>,
        product: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            organization: organization.into(),
            product: product.into(),
            credentials,
            base_url: None,
            ca_cert: None,
            timeout: None,
            user_agent: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_ca_cert(mut self, ca_cert: CertificateChain) -> Self {
        self.ca_cert = Some(ca_cert);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the NervesHub user API.
///
/// Holds the organization/product scope, a base URL and an HTTP client
/// carrying the credentials. Stateless between calls: every method is a
/// single request with no retries and no caching.
pub struct NervesHubClient {
    http: reqwest::Client,
    base_url: Url,
    organization: String,
    product: String,
}

impl NervesHubClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client, validating credentials and trust material first.
    ///
    /// Fails with [`Error::Config`] on a bad base URL, malformed PEM, a
    /// self-hosted endpoint with no CA, or an unusable token. No network
    /// activity happens here.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let base_url = parse_base_url(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let trust = TrustAnchor::resolve(&base_url, config.ca_cert)?;

        let transport = TransportConfig {
            trust,
            timeout: config.timeout,
            user_agent: config
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
        };
        let http = transport.build_client(&config.credentials)?;

        debug!(
            base_url = %base_url,
            org = %config.organization,
            product = %config.product,
            "NervesHub client ready"
        );

        Ok(Self {
            http,
            base_url,
            organization: config.organization,
            product: config.product,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages TLS and auth).
    pub fn from_reqwest(
        base_url: &str,
        organization: impl Into<String>,
        product: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
            organization: organization.into(),
            product: product.into(),
        })
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Paths ────────────────────────────────────────────────────────

    /// `/orgs/{org}/products/{product}/devices`, plus `/{identifier}` when given.
    ///
    /// This is the readable form. Requests percent-encode each segment.
    pub fn device_path(&self, identifier: Option<&str>) -> String {
        let mut path = format!(
            "/orgs/{}/products/{}/devices",
            self.organization, self.product
        );
        if let Some(identifier) = identifier {
            path.push('/');
            path.push_str(identifier);
        }
        path
    }

    /// `/orgs/{org}/products/{product}/devices/{identifier}/certificates`
    pub fn device_cert_path(&self, identifier: &str) -> String {
        format!("{}/certificates", self.device_path(Some(identifier)))
    }

    /// Request URL for `devices` plus `segments`.
    ///
    /// Every segment is percent-encoded, so an identifier holding `/`, `?`
    /// or `#` stays a single path segment. A trailing slash on the base is
    /// tolerated.
    pub(crate) fn device_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend([
                "orgs",
                self.organization.as_str(),
                "products",
                self.product.as_str(),
                "devices",
            ])
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    /// POST a form-encoded body.
    pub(crate) async fn post_form<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).form(body).send().await?;
        Self::handle_response(resp).await
    }

    /// DELETE, returning the success status without reading a body.
    pub(crate) async fn delete(&self, url: Url) -> Result<reqwest::StatusCode, Error> {
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        let status = resp.status();
        trace!(%status, "response");
        if status.is_success() {
            Ok(status)
        } else {
            Err(Self::parse_error(resp).await)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        trace!(%status, "response");
        if !status.is_success() {
            return Err(Self::parse_error(resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Map a non-2xx response to [`Error::Api`].
    ///
    /// The reason reads like `422 Unprocessable Entity for url: ...`, with
    /// the server's `errors` summary appended when the body has one.
    async fn parse_error(resp: reqwest::Response) -> Error {
        let status = resp.status();
        let mut reason = format!(
            "{} {} for url: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status"),
            resp.url()
        );

        let raw = resp.text().await.unwrap_or_default();
        let errors = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(parsed) => {
                if let Some(summary) = parsed.summary() {
                    reason.push_str(": ");
                    reason.push_str(&summary);
                }
                parsed.errors
            }
            Err(_) => None,
        };

        Error::Api {
            status: status.as_u16(),
            reason,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn client(base: &str) -> NervesHubClient {
        NervesHubClient::from_reqwest(base, "acme", "widget", reqwest::Client::new()).unwrap()
    }

    #[test]
    fn device_path_without_identifier() {
        let c = client(DEFAULT_BASE_URL);
        assert_eq!(c.device_path(None), "/orgs/acme/products/widget/devices");
    }

    #[test]
    fn device_path_with_identifier() {
        let c = client(DEFAULT_BASE_URL);
        assert_eq!(
            c.device_path(Some("abc123")),
            "/orgs/acme/products/widget/devices/abc123"
        );
        assert_eq!(
            c.device_cert_path("abc123"),
            "/orgs/acme/products/widget/devices/abc123/certificates"
        );
    }

    #[test]
    fn device_url_joins_base_and_segments() {
        let c = client("https://hub.example.com/");
        assert_eq!(
            c.device_url(&[]).unwrap().as_str(),
            "https://hub.example.com/orgs/acme/products/widget/devices"
        );

        let prefixed = client("https://hub.example.com/api/");
        assert_eq!(
            prefixed.device_url(&["abc", "certificates"]).unwrap().as_str(),
            "https://hub.example.com/api/orgs/acme/products/widget/devices/abc/certificates"
        );
    }

    #[test]
    fn device_url_encodes_reserved_characters() {
        let c = client(DEFAULT_BASE_URL);
        let url = c.device_url(&["a/b?c#d e"]).unwrap();
        assert_eq!(
            url.path(),
            "/orgs/acme/products/widget/devices/a%2Fb%3Fc%23d%20e"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let scoped = NervesHubClient::from_reqwest(
            DEFAULT_BASE_URL,
            "my org",
            "p/1",
            reqwest::Client::new(),
        )
        .unwrap();
        assert_eq!(
            scoped.device_url(&[]).unwrap().path(),
            "/orgs/my%20org/products/p%2F1/devices"
        );
    }

    #[test]
    fn default_endpoint_detection() {
        let yes = ["https://api.nerves-hub.org", "https://api.nerves-hub.org/"];
        let no = [
            "http://api.nerves-hub.org",
            "https://api.nerves-hub.org:8443",
            "https://api.nerves-hub.org/v2",
            "https://hub.example.com",
        ];
        for u in yes {
            assert!(is_default_endpoint(&Url::parse(u).unwrap()), "{u}");
        }
        for u in no {
            assert!(!is_default_endpoint(&Url::parse(u).unwrap()), "{u}");
        }
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            parse_base_url("ftp://hub.example.com"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn self_hosted_without_ca_fails_before_any_request() {
        let config = ClientConfig::new("acme", "widget", Credentials::token("t"))
            .with_base_url("https://hub.example.com");
        let err = NervesHubClient::new(config).err().unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::TrustAnchorRequired { .. })
        ));
    }

    #[test]
    fn default_endpoint_builds_with_token() {
        let c = NervesHubClient::new(ClientConfig::new("acme", "widget", Credentials::token("t")))
            .unwrap();
        assert_eq!(c.base_url().as_str(), "https://api.nerves-hub.org/");
        assert_eq!(c.organization(), "acme");
        assert_eq!(c.product(), "widget");
    }
}
