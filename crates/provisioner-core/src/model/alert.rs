// ── Alerts ──
//
// User-visible feedback produced by polls and actions.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity. Server responses may carry values outside the known set;
/// those are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Danger,
    Success,
    Info,
    Warning,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Danger => "danger",
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "danger" => Self::Danger,
            "success" => Self::Success,
            "info" => Self::Info,
            "warning" => Self::Warning,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Unix seconds.
    pub timestamp: i64,
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    /// An alert stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            severity,
            message: message.into(),
        }
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }

    pub fn is_danger(&self) -> bool {
        self.severity == Severity::Danger
    }
}
