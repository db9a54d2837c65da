use thiserror::Error;

use crate::models::ActionResponse;

/// Top-level error type for the `provisioner-api` crate.
///
/// Distinguishes requests that never reached the server from requests the
/// server answered with a failure. `provisioner-core` turns these into
/// user-facing alert messages.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// No response arrived (refused, reset, closed before the response head).
    #[error("Could not reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// Request timed out.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Any other HTTP transport error.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing or joining error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (CA file unreadable, client build failure).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server responses ────────────────────────────────────────────
    /// The server answered with a non-success status code.
    ///
    /// `body` holds the `{type, message}` payload when the error response
    /// carried one.
    #[error("HTTP {status}: {reason}")]
    Http {
        status: u16,
        reason: String,
        body: Option<ActionResponse>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request never got a response from the server:
    /// connect failures, dropped connections and timeouts.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }

    /// Short status text for the failure: the numeric HTTP status for
    /// server errors, otherwise a category (`timeout`, `parsererror`, `error`).
    pub fn status_text(&self) -> String {
        match self {
            Self::Http { status, .. } => status.to_string(),
            Self::Timeout { .. } => "timeout".into(),
            Self::Deserialization { .. } => "parsererror".into(),
            Self::Transport(e) => e
                .status()
                .map_or_else(|| "error".into(), |s| s.as_u16().to_string()),
            Self::Unreachable { .. } | Self::InvalidUrl(_) | Self::Tls(_) => "error".into(),
        }
    }

    /// Descriptive error text for the failure (HTTP reason phrase, parser
    /// message, or the underlying transport error).
    pub fn error_text(&self) -> String {
        match self {
            Self::Http { reason, .. } => reason.clone(),
            Self::Timeout { .. } => "timeout".into(),
            Self::Deserialization { message, .. } => message.clone(),
            Self::Unreachable { reason, .. } => reason.clone(),
            Self::Transport(e) => e.to_string(),
            Self::InvalidUrl(e) => e.to_string(),
            Self::Tls(msg) => msg.clone(),
        }
    }

    /// The status text, falling back to the error text when empty.
    pub fn status_or_error(&self) -> String {
        let status = self.status_text();
        if status.is_empty() {
            self.error_text()
        } else {
            status
        }
    }

    /// The `{type, message}` payload of an error response, if any.
    pub fn response_body(&self) -> Option<&ActionResponse> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
