// nerves-hub-api: Async Rust client for the NervesHub device management API

pub mod auth;
pub mod client;
mod devices;
pub mod env;
pub mod error;
pub mod material;
pub mod models;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{AuthKind, Credentials};
pub use client::{ClientConfig, DEFAULT_BASE_URL, NervesHubClient};
pub use error::{ConfigError, Error};
pub use material::{CertificateChain, KeyFormat, PrivateKey, decode_env_value};
pub use models::{Device, DeviceCertificate, Envelope};
pub use transport::{TransportConfig, TrustAnchor};
