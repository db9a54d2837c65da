//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use provisioner_config::ConfigError;
use provisioner_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const ACTION_FAILED: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not initialize provisioner at {url}")]
    #[diagnostic(
        code(provisioner::bootstrap_failed),
        help(
            "Check that the server is running and serves its URL directory.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: CoreError,
    },

    #[error("Could not connect to server.")]
    #[diagnostic(
        code(provisioner::unreachable),
        help("The URL directory loaded, but the device endpoint did not answer.")
    )]
    Unreachable,

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(provisioner::not_found),
        help("Run: provisioner {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Server ───────────────────────────────────────────────────────

    #[error("Request failed: {message}")]
    #[diagnostic(code(provisioner::api_error))]
    Api { message: String },

    #[error("{message}")]
    #[diagnostic(code(provisioner::action_failed))]
    ActionFailed { message: String },

    #[error("The server's URL directory is incomplete: {message}")]
    #[diagnostic(
        code(provisioner::directory),
        help("Check the server version; the directory must list a `devices` endpoint.")
    )]
    Directory { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(provisioner::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(provisioner::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No provisioner URL configured")]
    #[diagnostic(
        code(provisioner::no_config),
        help(
            "Pass --url (or set PROVISIONER_URL), or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(provisioner::config))]
    Config { message: String },

    // ── Output ───────────────────────────────────────────────────────

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(provisioner::render))]
    Render { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Unreachable => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ActionFailed { .. } => exit_code::ACTION_FAILED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Wrap a bootstrap failure with the URL that was tried.
    pub fn bootstrap(url: &url::Url, err: CoreError) -> Self {
        match err {
            CoreError::Bootstrap { .. } => Self::ConnectionFailed {
                url: url.to_string(),
                source: err,
            },
            other => other.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TransportUnreachable => Self::Unreachable,

            CoreError::DeviceNotFound { mac } => Self::NotFound {
                resource_type: "device".into(),
                identifier: mac,
                list_command: "devices list".into(),
            },

            CoreError::InvalidRate { reason } => Self::Validation {
                field: "refresh".into(),
                reason,
            },

            e @ (CoreError::UnknownEndpoint { .. } | CoreError::MissingParameter { .. }) => {
                Self::Directory {
                    message: e.to_string(),
                }
            }

            CoreError::Config { message } => Self::Config { message },

            e @ CoreError::Bootstrap { .. } => Self::ConnectionFailed {
                url: "(configured server)".into(),
                source: e,
            },

            e @ (CoreError::UnknownAction { .. }
            | CoreError::MissingRoute { .. }
            | CoreError::PreconditionFailed { .. }
            | CoreError::ActionFailed { .. }) => Self::ActionFailed {
                message: e.to_string(),
            },

            e @ CoreError::TransportError { .. } => Self::Api {
                message: e.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
