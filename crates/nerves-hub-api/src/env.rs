// Environment-driven construction.
//
//   NERVES_HUB_ORG, NERVES_HUB_PRODUCT     required
//   NERVES_HUB_CERT + NERVES_HUB_KEY       mTLS, PEM or base64 PEM
//   NERVES_HUB_TOKEN                       token auth (exclusive with the above)
//   NERVES_HUB_BASE_URL                    optional
//   NERVES_HUB_CA_CERT                     optional, PEM or base64 PEM;
//                                          required for a non-default base URL

use secrecy::SecretString;

use crate::auth::Credentials;
use crate::client::{ClientConfig, NervesHubClient};
use crate::error::{ConfigError, Error};
use crate::material::{CertificateChain, PrivateKey};

pub const ENV_ORG: &str = "NERVES_HUB_ORG";
pub const ENV_PRODUCT: &str = "NERVES_HUB_PRODUCT";
pub const ENV_CERT: &str = "NERVES_HUB_CERT";
pub const ENV_KEY: &str = "NERVES_HUB_KEY";
pub const ENV_TOKEN: &str = "NERVES_HUB_TOKEN";
pub const ENV_BASE_URL: &str = "NERVES_HUB_BASE_URL";
pub const ENV_CA_CERT: &str = "NERVES_HUB_CA_CERT";

impl ClientConfig {
    /// Read the configuration from `NERVES_HUB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnv { name });

        let organization = require(ENV_ORG)?;
        let product = require(ENV_PRODUCT)?;

        let cert = get(ENV_CERT)
            .map(|v| CertificateChain::from_env_value(&v))
            .transpose()?;
        let key = get(ENV_KEY)
            .map(|v| PrivateKey::from_env_value(&v))
            .transpose()?;
        let token = get(ENV_TOKEN).map(SecretString::from);
        let credentials = Credentials::from_parts(cert, key, token)?;

        let ca_cert = get(ENV_CA_CERT)
            .map(|v| CertificateChain::from_env_value(&v))
            .transpose()?;

        Ok(Self {
            base_url: get(ENV_BASE_URL),
            ca_cert,
            ..Self::new(organization, product, credentials)
        })
    }
}

impl NervesHubClient {
    /// Build a client straight from `NERVES_HUB_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(ClientConfig::from_env()?)
    }
}
