use thiserror::Error;

/// Top-level error type for the `nerves-hub-api` crate.
///
/// Construction problems surface as [`Error::Config`] before any network
/// activity. Every non-2xx response becomes [`Error::Api`]; connection and
/// TLS failures pass through from `reqwest` as [`Error::Transport`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Client could not be built from the supplied inputs.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response from NervesHub.
    ///
    /// `status` is the HTTP status code exactly as received. `errors` holds
    /// the raw `errors` object from the body when the server sent one.
    #[error("NervesHub API error (HTTP {status}): {reason}")]
    Api {
        status: u16,
        reason: String,
        errors: Option<serde_json::Value>,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, TLS handshake, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Why a client could not be constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither a certificate/key pair nor a token was supplied.
    #[error("no credentials supplied: provide a certificate and key, or a token")]
    MissingCredentials,

    /// Both a certificate/key pair and a token were supplied.
    #[error("conflicting credentials: provide either a certificate and key, or a token, not both")]
    ConflictingCredentials,

    /// Only one half of a certificate/key pair was supplied.
    #[error("incomplete certificate credentials: missing {missing}")]
    IncompleteCertKey { missing: &'static str },

    /// Self-hosted endpoints have no built-in trust anchor.
    #[error("a CA certificate is required for non-default endpoint {base_url}")]
    TrustAnchorRequired { base_url: String },

    /// Certificate or key material could not be parsed.
    #[error("invalid {what}: {reason}")]
    InvalidPem { what: &'static str, reason: String },

    /// Token contains characters that cannot appear in an HTTP header.
    #[error("invalid token: not a valid header value")]
    InvalidToken,

    /// Base URL is not an absolute http(s) URL.
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A required environment variable is unset or empty.
    #[error("environment variable {name} is not set")]
    MissingEnv { name: &'static str },

    /// The TLS stack rejected the identity or trust material.
    #[error("TLS setup failed: {0}")]
    Tls(String),
}

impl Error {
    /// The HTTP status code, if this error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the server rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns `true` if the request conflicts with existing state
    /// (e.g. a device identifier that has already been taken).
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409 | 422))
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The client itself never retries; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }
}
