// ── Core error types ──
//
// Two families live here. Contract violations (unknown endpoint, missing
// URL parameter, invalid refresh rate) are returned to the caller.
// Runtime failures (device lookups, action preconditions, transport
// errors) are absorbed into the alert log: their `Display` text is the
// exact message the user sees.

use thiserror::Error;

use crate::action::{DeviceAction, Precondition};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Contract violations (returned to the caller) ────────────────
    #[error("Named URL {name} not found.")]
    UnknownEndpoint { name: String },

    #[error("Missing parameter {name}")]
    MissingParameter { name: String },

    #[error("Invalid refresh rate: {reason}")]
    InvalidRate { reason: String },

    // ── Action validation (absorbed into the alert log) ─────────────
    #[error("Device {mac} not found.")]
    DeviceNotFound { mac: String },

    #[error("Unknown action: {action}.")]
    UnknownAction { action: String },

    #[error("Don't know how to perform {action} action: Missing route.")]
    MissingRoute { action: DeviceAction },

    #[error("No {precondition} found for device {mac}.")]
    PreconditionFailed {
        precondition: Precondition,
        mac: String,
    },

    // ── Transport (absorbed into the alert log) ─────────────────────
    #[error("Could not connect to server.")]
    TransportUnreachable,

    #[error("{status}: {error}")]
    TransportError { status: String, error: String },

    #[error("Executing {action} for device {mac} failed ({detail})")]
    ActionFailed {
        action: DeviceAction,
        mac: String,
        detail: String,
    },

    // ── Setup ────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to initialize Provisioner.")]
    Bootstrap {
        #[source]
        source: provisioner_api::Error,
    },
}

impl CoreError {
    /// Classify a failed read request (device poll, single-device fetch).
    pub fn from_request_failure(err: &provisioner_api::Error) -> Self {
        if err.is_unreachable() {
            Self::TransportUnreachable
        } else {
            Self::TransportError {
                status: err.status_text(),
                error: err.error_text(),
            }
        }
    }

    /// Returns `true` for errors raised synchronously by API misuse rather
    /// than by runtime conditions.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownEndpoint { .. } | Self::MissingParameter { .. } | Self::InvalidRate { .. }
        )
    }
}
