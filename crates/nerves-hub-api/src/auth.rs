use secrecy::SecretString;

use crate::error::ConfigError;
use crate::material::{CertificateChain, PrivateKey};

/// Which authentication strategy a client uses.
///
/// Marker enum (no data) -- the actual secrets live in [`Credentials`].
/// Useful for logging and branching without carrying secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// Mutual TLS with a client certificate.
    CertKey,
    /// `Authorization: Bearer` header.
    Token,
}

/// Credentials for authenticating with NervesHub.
///
/// Exactly one mode per client. Build directly, or use
/// [`Credentials::from_parts`] when the inputs are individually optional
/// (environment variables, config files).
#[derive(Debug)]
pub enum Credentials {
    /// Client certificate chain and its private key, presented during the
    /// TLS handshake.
    CertKey {
        cert: CertificateChain,
        key: PrivateKey,
    },

    /// User access token, sent on every request.
    Token(SecretString),
}

impl Credentials {
    pub fn cert_key(cert: CertificateChain, key: PrivateKey) -> Self {
        Self::CertKey { cert, key }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(SecretString::from(token.into()))
    }

    /// Pick the credential mode from optional inputs.
    ///
    /// A certificate needs its key (and vice versa); a token excludes both.
    pub fn from_parts(
        cert: Option<CertificateChain>,
        key: Option<PrivateKey>,
        token: Option<SecretString>,
    ) -> Result<Self, ConfigError> {
        match (cert, key, token) {
            (Some(cert), Some(key), None) => Ok(Self::CertKey { cert, key }),
            (None, None, Some(token)) => Ok(Self::Token(token)),
            (None, None, None) => Err(ConfigError::MissingCredentials),
            (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => {
                Err(ConfigError::ConflictingCredentials)
            }
            (Some(_), None, None) => Err(ConfigError::IncompleteCertKey {
                missing: "private key",
            }),
            (None, Some(_), None) => Err(ConfigError::IncompleteCertKey {
                missing: "certificate",
            }),
        }
    }

    pub fn kind(&self) -> AuthKind {
        match self {
            Self::CertKey { .. } => AuthKind::CertKey,
            Self::Token(_) => AuthKind::Token,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const CERT_PEM: &str = include_str!("../tests/fixtures/cert.pem");
    const KEY_PEM: &str = include_str!("../tests/fixtures/key.pem");

    fn cert() -> Option<CertificateChain> {
        Some(CertificateChain::from_pem(CERT_PEM).unwrap())
    }

    fn key() -> Option<PrivateKey> {
        Some(PrivateKey::from_pem(KEY_PEM).unwrap())
    }

    fn token() -> Option<SecretString> {
        Some(SecretString::from("nhu_secret".to_string()))
    }

    #[test]
    fn cert_and_key_select_mtls() {
        let creds = Credentials::from_parts(cert(), key(), None).unwrap();
        assert_eq!(creds.kind(), AuthKind::CertKey);
    }

    #[test]
    fn token_alone_selects_token() {
        let creds = Credentials::from_parts(None, None, token()).unwrap();
        assert_eq!(creds.kind(), AuthKind::Token);
    }

    #[test]
    fn neither_mode_is_rejected() {
        assert!(matches!(
            Credentials::from_parts(None, None, None),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn both_modes_are_rejected() {
        assert!(matches!(
            Credentials::from_parts(cert(), key(), token()),
            Err(ConfigError::ConflictingCredentials)
        ));
        assert!(matches!(
            Credentials::from_parts(cert(), None, token()),
            Err(ConfigError::ConflictingCredentials)
        ));
    }

    #[test]
    fn half_a_pair_is_rejected() {
        assert!(matches!(
            Credentials::from_parts(cert(), None, None),
            Err(ConfigError::IncompleteCertKey { missing: "private key" })
        ));
        assert!(matches!(
            Credentials::from_parts(None, key(), None),
            Err(ConfigError::IncompleteCertKey { missing: "certificate" })
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", Credentials::token("nhu_secret"));
        assert!(!rendered.contains("nhu_secret"));
    }
}
