// ── Runtime connection configuration ──
//
// These types describe how to reach a provisioner server and how often to
// poll it. They never touch disk: the CLI builds a `ProvisionerConfig` and
// hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use provisioner_api::{TlsMode, TransportConfig};

use crate::refresh::RefreshRate;

/// Path of the URL directory endpoint on a stock server.
pub const DEFAULT_DIRECTORY_PATH: &str = "/api";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single provisioner server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Server root (e.g. `http://10.0.0.2:8080`). Scheme-relative directory
    /// entries inherit its scheme.
    pub url: Url,
    /// Where the URL directory is served, relative to `url`.
    pub directory_path: String,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Polling rate applied right after construction.
    pub refresh: RefreshRate,
}

impl ProvisionerConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            directory_path: DEFAULT_DIRECTORY_PATH.to_owned(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh: RefreshRate::Disabled,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
