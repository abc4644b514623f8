// Certificate and private-key material.
//
// Inputs arrive as PEM bytes, as pre-parsed DER objects, or as environment
// values holding either PEM text or base64-encoded PEM. Everything is
// normalized here into DER plus a canonical PEM rendering that the TLS
// stack can consume directly from memory.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pem::{EncodeConfig, LineEnding, Pem};
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use secrecy::{ExposeSecret, SecretSlice};

use crate::error::ConfigError;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Decode an environment value that may be base64-encoded PEM or literal PEM.
///
/// Strict standard-alphabet base64 (canonical padding, no whitespace) is
/// tried first; anything that fails to decode is returned as literal bytes.
/// PEM text never decodes because of its `-----BEGIN` armour.
pub fn decode_env_value(raw: &str) -> Vec<u8> {
    STANDARD
        .decode(raw.as_bytes())
        .unwrap_or_else(|_| raw.as_bytes().to_vec())
}

fn encode_config() -> EncodeConfig {
    EncodeConfig::new().set_line_ending(LineEnding::LF)
}

// ── Certificates ────────────────────────────────────────────────────

/// One or more X.509 certificates, leaf first.
///
/// Used both for a client certificate chain and for a CA bundle.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<CertificateDer<'static>>,
}

impl CertificateChain {
    /// Parse every `CERTIFICATE` block from PEM input.
    ///
    /// Other block types and text between blocks are ignored; at least
    /// one certificate must be present.
    pub fn from_pem(input: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let blocks = pem::parse_many(input.as_ref()).map_err(|e| ConfigError::InvalidPem {
            what: "certificate",
            reason: e.to_string(),
        })?;

        let certs: Vec<CertificateDer<'static>> = blocks
            .into_iter()
            .filter(|block| block.tag() == CERTIFICATE_TAG)
            .map(|block| CertificateDer::from(block.into_contents()))
            .collect();

        Self::from_der(certs)
    }

    /// Wrap already-parsed DER certificates.
    pub fn from_der(certs: Vec<CertificateDer<'static>>) -> Result<Self, ConfigError> {
        if certs.is_empty() {
            return Err(ConfigError::InvalidPem {
                what: "certificate",
                reason: "no CERTIFICATE block found".into(),
            });
        }
        Ok(Self { certs })
    }

    /// Parse an environment value (base64 PEM or literal PEM).
    pub fn from_env_value(raw: &str) -> Result<Self, ConfigError> {
        Self::from_pem(decode_env_value(raw))
    }

    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certs
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Canonical PEM rendering (LF line endings, 64-column wrap).
    pub fn to_pem(&self) -> Vec<u8> {
        let blocks: Vec<Pem> = self
            .certs
            .iter()
            .map(|der| Pem::new(CERTIFICATE_TAG, der.as_ref().to_vec()))
            .collect();
        pem::encode_many_config(&blocks, encode_config()).into_bytes()
    }
}

impl From<CertificateDer<'static>> for CertificateChain {
    fn from(cert: CertificateDer<'static>) -> Self {
        Self { certs: vec![cert] }
    }
}

impl fmt::Debug for CertificateChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateChain")
            .field("certificates", &self.certs.len())
            .finish()
    }
}

// ── Private keys ────────────────────────────────────────────────────

/// Encoding of a private key's DER bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// `PRIVATE KEY` (any algorithm).
    Pkcs8,
    /// `RSA PRIVATE KEY`.
    Pkcs1,
    /// `EC PRIVATE KEY`.
    Sec1,
}

impl KeyFormat {
    fn pem_tag(self) -> &'static str {
        match self {
            Self::Pkcs8 => "PRIVATE KEY",
            Self::Pkcs1 => "RSA PRIVATE KEY",
            Self::Sec1 => "EC PRIVATE KEY",
        }
    }

    fn from_pem_tag(tag: &str) -> Option<Self> {
        match tag {
            "PRIVATE KEY" => Some(Self::Pkcs8),
            "RSA PRIVATE KEY" => Some(Self::Pkcs1),
            "EC PRIVATE KEY" => Some(Self::Sec1),
            _ => None,
        }
    }
}

/// An unencrypted client private key.
///
/// The DER bytes live in a zeroizing secret box and never appear in
/// `Debug` output.
pub struct PrivateKey {
    format: KeyFormat,
    der: SecretSlice<u8>,
}

impl PrivateKey {
    /// Parse the first private-key block from PEM input.
    pub fn from_pem(input: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let blocks = pem::parse_many(input.as_ref()).map_err(|e| ConfigError::InvalidPem {
            what: "private key",
            reason: e.to_string(),
        })?;

        if blocks
            .iter()
            .any(|block| block.tag() == "ENCRYPTED PRIVATE KEY")
        {
            return Err(ConfigError::InvalidPem {
                what: "private key",
                reason: "encrypted private keys are not supported".into(),
            });
        }

        let (format, block) = blocks
            .into_iter()
            .find_map(|block| KeyFormat::from_pem_tag(block.tag()).map(|f| (f, block)))
            .ok_or_else(|| ConfigError::InvalidPem {
                what: "private key",
                reason: "no PRIVATE KEY block found".into(),
            })?;

        Ok(Self::new(format, block.into_contents()))
    }

    /// Copy an already-parsed key.
    pub fn from_der(key: &PrivateKeyDer<'_>) -> Result<Self, ConfigError> {
        let format = match key {
            PrivateKeyDer::Pkcs8(_) => KeyFormat::Pkcs8,
            PrivateKeyDer::Pkcs1(_) => KeyFormat::Pkcs1,
            PrivateKeyDer::Sec1(_) => KeyFormat::Sec1,
            _ => {
                return Err(ConfigError::InvalidPem {
                    what: "private key",
                    reason: "unsupported key encoding".into(),
                });
            }
        };
        Ok(Self::new(format, key.secret_der().to_vec()))
    }

    /// Parse an environment value (base64 PEM or literal PEM).
    pub fn from_env_value(raw: &str) -> Result<Self, ConfigError> {
        Self::from_pem(decode_env_value(raw))
    }

    fn new(format: KeyFormat, der: Vec<u8>) -> Self {
        Self {
            format,
            der: SecretSlice::from(der),
        }
    }

    pub fn format(&self) -> KeyFormat {
        self.format
    }

    /// The raw DER bytes.
    pub fn secret_der(&self) -> &[u8] {
        self.der.expose_secret()
    }

    /// Canonical PEM rendering. Callers own zeroizing the result.
    pub(crate) fn to_pem(&self) -> Vec<u8> {
        let block = Pem::new(self.format.pem_tag(), self.secret_der().to_vec());
        pem::encode_config(&block, encode_config()).into_bytes()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("format", &self.format)
            .field("der", &"[REDACTED]")
            .finish()
    }
}
