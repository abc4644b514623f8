//! Shared settings for NervesHub tools.
//!
//! Layers a TOML file and `NERVES_HUB_*` environment variables with
//! figment, then resolves the result into a `nerves_hub_api::ClientConfig`.
//! Inline credential values accept PEM text or base64-encoded PEM, the
//! same as the library's environment entry point.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use nerves_hub_api::{CertificateChain, ClientConfig, Credentials, PrivateKey, decode_env_value};

/// Prefix shared by every environment variable this crate reads.
pub const ENV_PREFIX: &str = "NERVES_HUB_";

/// Settings read from the environment verbatim, never parsed as numbers.
const TEXT_KEYS: [&str; 10] = [
    "org",
    "product",
    "base_url",
    "cert",
    "key",
    "token",
    "ca_cert",
    "cert_file",
    "key_file",
    "ca_cert_file",
];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{field}'")]
    Missing { field: &'static str },

    #[error(transparent)]
    Client(#[from] nerves_hub_api::ConfigError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Raw settings as they appear in the TOML file or environment.
///
/// Every field is optional here; [`Settings::into_client_config`] decides
/// what is actually required.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub org: Option<String>,
    pub product: Option<String>,

    /// API endpoint (defaults to the public NervesHub API).
    pub base_url: Option<String>,

    /// Client certificate, PEM or base64 PEM.
    pub cert: Option<String>,
    /// Client private key, PEM or base64 PEM.
    pub key: Option<SecretString>,
    /// User access token (exclusive with cert/key).
    pub token: Option<SecretString>,
    /// CA certificate(s) for a self-hosted endpoint, PEM or base64 PEM.
    pub ca_cert: Option<String>,

    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_cert_file: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

impl Settings {
    /// Resolve into a library `ClientConfig`.
    ///
    /// Inline values take priority over their `*_file` counterparts.
    /// Credential and PEM validation is delegated to `nerves-hub-api`.
    pub fn into_client_config(self) -> Result<ClientConfig, ConfigError> {
        let org = self.org.ok_or(ConfigError::Missing { field: "org" })?;
        let product = self.product.ok_or(ConfigError::Missing { field: "product" })?;

        let cert = load_material(self.cert.as_deref(), self.cert_file.as_deref())?
            .map(CertificateChain::from_pem)
            .transpose()?;
        let key = load_material(
            self.key.as_ref().map(ExposeSecret::expose_secret),
            self.key_file.as_deref(),
        )?
        .map(PrivateKey::from_pem)
        .transpose()?;
        let ca_cert = load_material(self.ca_cert.as_deref(), self.ca_cert_file.as_deref())?
            .map(CertificateChain::from_pem)
            .transpose()?;

        let credentials = Credentials::from_parts(cert, key, self.token)?;

        Ok(ClientConfig {
            base_url: self.base_url,
            ca_cert,
            timeout: self.timeout.map(Duration::from_secs),
            ..ClientConfig::new(org, product, credentials)
        })
    }
}

/// Inline value (decoded as PEM-or-base64) or the contents of `file`.
fn load_material(inline: Option<&str>, file: Option<&Path>) -> Result<Option<Vec<u8>>, ConfigError> {
    if let Some(value) = inline.filter(|v| !v.is_empty()) {
        return Ok(Some(decode_env_value(value)));
    }
    match file {
        Some(path) => std::fs::read(path)
            .map(Some)
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        None => Ok(None),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "nerves-hub", "nerves-hub").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("nerves-hub");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from `path` (or [`config_path`]) overlaid with the environment.
///
/// A missing file is not an error; environment variables win over the file.
/// Text settings keep their exact value (`NERVES_HUB_ORG=0042` stays
/// `"0042"`); only `timeout` goes through figment's value parsing.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), "loading settings");

    let settings = Figment::new()
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&TEXT_KEYS))
        .merge(Serialized::defaults(text_env()))
        .extract()?;
    Ok(settings)
}

/// Non-empty `NERVES_HUB_*` values for [`TEXT_KEYS`], as raw strings.
fn text_env() -> BTreeMap<&'static str, String> {
    TEXT_KEYS
        .iter()
        .filter_map(|key| {
            let name = format!("{ENV_PREFIX}{}", key.to_uppercase());
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .map(|value| (*key, value))
        })
        .collect()
}
