//! CLI error types with miette diagnostics.
//!
//! Maps library and settings errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use nerves_hub_api::Error as ApiError;
use nerves_hub_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const CONFIG: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Missing required setting '{field}'")]
    #[diagnostic(
        code(nerves_hub::missing_setting),
        help(
            "Pass --{field}, set NERVES_HUB_{env}, or add `{field} = \"...\"` to {path}"
        )
    )]
    MissingSetting {
        field: &'static str,
        env: String,
        path: String,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(nerves_hub::config),
        help(
            "Authenticate with NERVES_HUB_CERT + NERVES_HUB_KEY (or cert_file/key_file),\n\
             or with NERVES_HUB_TOKEN. Self-hosted endpoints also need NERVES_HUB_CA_CERT."
        )
    )]
    Config { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach NervesHub at {url}")]
    #[diagnostic(
        code(nerves_hub::connection_failed),
        help("Check the base URL, your network, and that the CA certificate matches the server.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Authentication failed (HTTP {status}): {reason}")]
    #[diagnostic(
        code(nerves_hub::auth_failed),
        help("Verify your certificate/key or token, and that it has access to this organization.")
    )]
    AuthFailed { status: u16, reason: String },

    #[error("Not found: {reason}")]
    #[diagnostic(
        code(nerves_hub::not_found),
        help("Run: nerves-hub devices list to see registered devices")
    )]
    NotFound { reason: String },

    #[error("Rejected by NervesHub: {reason}")]
    #[diagnostic(code(nerves_hub::conflict))]
    Conflict { reason: String },

    #[error("API error (HTTP {status}): {reason}")]
    #[diagnostic(code(nerves_hub::api_error))]
    Api { status: u16, reason: String },

    #[error("Unexpected response from NervesHub: {message}")]
    #[diagnostic(code(nerves_hub::unexpected_response))]
    UnexpectedResponse { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(nerves_hub::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingSetting { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library error → CliError mapping ────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Config(e) => Self::Config {
                message: e.to_string(),
            },

            ApiError::Api {
                status: status @ (401 | 403),
                reason,
                ..
            } => Self::AuthFailed { status, reason },

            ApiError::Api {
                status: 404,
                reason,
                ..
            } => Self::NotFound { reason },

            ApiError::Api {
                status: 409 | 422,
                reason,
                ..
            } => Self::Conflict { reason },

            ApiError::Api { status, reason, .. } => Self::Api { status, reason },

            ApiError::Transport(e) => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },

            ApiError::InvalidUrl(e) => Self::Config {
                message: format!("invalid request URL: {e}"),
            },

            ApiError::Deserialization { message, .. } => Self::UnexpectedResponse { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { field } => Self::MissingSetting {
                field,
                env: field.to_uppercase(),
                path: nerves_hub_config::config_path().display().to_string(),
            },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
