//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use gatedeck_config::ConfigError;
use gatedeck_core::{CoreError, ErrorArray};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("invalid configuration\n{errors}")]
    #[diagnostic(
        code(gatedeck::invalid_config),
        help("Fix the flags or the profile in {path}")
    )]
    InvalidConfig { errors: ErrorArray, path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(gatedeck::profile_not_found),
        help("Define [profiles.{name}] in {path}, or drop --profile")
    )]
    ProfileNotFound { name: String, path: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(gatedeck::no_credentials),
        help(
            "Pass --konnect-password, set GATEDECK_KONNECT_PASSWORD,\n\
             or store it in the system keyring under service 'gatedeck', entry '{profile}/password'."
        )
    )]
    NoCredentials { profile: String },

    #[error(transparent)]
    #[diagnostic(code(gatedeck::config))]
    Config(ConfigError),

    #[error("Could not build an API client")]
    #[diagnostic(
        code(gatedeck::client_setup),
        help("Check --headers (Key:Value), the address, and any TLS material.")
    )]
    ClientSetup {
        #[source]
        source: CoreError,
    },

    // ── Remote failures ──────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(gatedeck::auth_failed),
        help("Verify --konnect-email and the password for this profile.")
    )]
    AuthFailed {
        #[source]
        source: CoreError,
    },

    #[error("No matching control plane")]
    #[diagnostic(
        code(gatedeck::control_plane),
        help("Pick one explicitly with --control-plane NAME.")
    )]
    ControlPlane {
        #[source]
        source: CoreError,
    },

    #[error("Could not connect to the API")]
    #[diagnostic(
        code(gatedeck::connection_failed),
        help(
            "Check --konnect-addr and network access.\n\
             For private CAs use --ca-cert-file; --tls-skip-verify disables checks entirely."
        )
    )]
    ConnectionFailed {
        #[source]
        source: CoreError,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(gatedeck::timeout),
        help("Increase the timeout with --timeout.")
    )]
    Timeout {
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    #[diagnostic(code(gatedeck::dump))]
    Dump(CoreError),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig { .. } | Self::ProfileNotFound { .. } | Self::ClientSetup { .. } => {
                exit_code::USAGE
            }
            Self::NoCredentials { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ControlPlane { .. } => exit_code::NOT_FOUND,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Config(_) | Self::Dump(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { profile, path } => {
                CliError::ProfileNotFound { name: profile, path }
            }
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let (timed_out, unreachable) = err
            .api_error()
            .map_or((false, false), |e| (e.is_timeout(), e.is_connect()));

        if timed_out {
            return CliError::Timeout { source: err };
        }
        if unreachable {
            return CliError::ConnectionFailed { source: err };
        }

        match err {
            CoreError::Config { .. } => CliError::ClientSetup { source: err },
            CoreError::Auth { .. } => CliError::AuthFailed { source: err },
            CoreError::Resolution { source: None, .. } => CliError::ControlPlane { source: err },
            CoreError::Validation(errors) => CliError::InvalidConfig {
                errors,
                path: gatedeck_config::config_path().display().to_string(),
            },
            other => CliError::Dump(other),
        }
    }
}
