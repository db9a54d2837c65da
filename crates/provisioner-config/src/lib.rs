//! Shared configuration for the provisioner tools.
//!
//! TOML profiles layered under `PROVISIONER_` environment variables, and
//! translation to `provisioner_core::ProvisionerConfig`. The CLI adds
//! flag-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use provisioner_core::{DEFAULT_DIRECTORY_PATH, ProvisionerConfig, RefreshRate, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());

        self.profiles
            .get(&name)
            .map(|p| (name.clone(), p))
            .ok_or(ConfigError::UnknownProfile { name })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Polling rate for `watch`: humantime duration or `off`.
    #[serde(default = "default_refresh")]
    pub refresh: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            refresh: default_refresh(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh() -> String {
    "off".into()
}

/// A named provisioner server profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "http://10.0.0.2:8080").
    pub url: String,

    /// Path of the URL directory endpoint (default `/api`).
    pub directory_path: Option<String>,

    /// Override the polling rate.
    pub refresh: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Profile {
    /// Validate and translate into a core `ProvisionerConfig`.
    pub fn to_provisioner_config(&self, defaults: &Defaults) -> Result<ProvisionerConfig, ConfigError> {
        let url: url::Url = self.url.parse().map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: format!("{e}: {}", self.url),
        })?;

        let tls = if self.insecure.unwrap_or(defaults.insecure) {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        let refresh = parse_refresh(self.refresh.as_deref().unwrap_or(&defaults.refresh))?;

        Ok(ProvisionerConfig {
            url,
            directory_path: self
                .directory_path
                .clone()
                .unwrap_or_else(|| DEFAULT_DIRECTORY_PATH.into()),
            tls,
            timeout: Duration::from_secs(self.timeout.unwrap_or(defaults.timeout)),
            refresh,
        })
    }
}

/// Parse a refresh setting (`off`, `30s`, `2m`, bare milliseconds).
pub fn parse_refresh(raw: &str) -> Result<RefreshRate, ConfigError> {
    raw.parse().map_err(|e: provisioner_core::CoreError| ConfigError::Validation {
        field: "refresh".into(),
        reason: e.to_string(),
    })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "provisioner", "provisioner").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("provisioner");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file is not an error.
///
/// Environment keys nest with a double underscore, e.g.
/// `PROVISIONER_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PROVISIONER_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    or_default(load_config(), &config_path())
}

fn or_default(loaded: Result<Config, ConfigError>, path: &Path) -> Config {
    loaded.unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "ignoring unreadable config file");
        Config::default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.defaults.refresh, "off");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_translates_to_core_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
default_profile = "lab"

[defaults]
timeout = 10

[profiles.lab]
url = "http://10.0.0.2:8080"
refresh = "5s"
"#,
        );
        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "lab");

        let core = profile.to_provisioner_config(&cfg.defaults).unwrap();
        assert_eq!(core.url.as_str(), "http://10.0.0.2:8080/");
        assert_eq!(core.directory_path, "/api");
        assert_eq!(core.timeout, Duration::from_secs(10));
        assert_eq!(core.refresh, RefreshRate::from_millis(5000));
        assert_eq!(core.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn tls_choice_follows_profile() {
        let defaults = Defaults::default();
        let mut profile = Profile {
            url: "https://prov.example".into(),
            ca_cert: Some("/etc/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(
            profile.to_provisioner_config(&defaults).unwrap().tls,
            TlsVerification::CustomCa("/etc/ca.pem".into())
        );
        profile.insecure = Some(true);
        assert_eq!(
            profile.to_provisioner_config(&defaults).unwrap().tls,
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        let defaults = Defaults::default();
        let bad_url = Profile {
            url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            bad_url.to_provisioner_config(&defaults),
            Err(ConfigError::Validation { ref field, .. }) if field == "url"
        ));

        let fast = Profile {
            url: "http://10.0.0.2".into(),
            refresh: Some("100ms".into()),
            ..Profile::default()
        };
        assert!(matches!(
            fast.to_provisioner_config(&defaults),
            Err(ConfigError::Validation { ref field, .. }) if field == "refresh"
        ));
    }

    #[test]
    fn unknown_profile() {
        let cfg = Config::default();
        let err = cfg.profile(Some("nope")).unwrap_err();
        assert_eq!(err.to_string(), "profile 'nope' not found");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "defaults = [not toml");
        let loaded = load_config_from(&path);
        assert!(matches!(loaded, Err(ConfigError::Figment(_))));

        let cfg = or_default(loaded, &path);
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.defaults.output, "table");
    }
}
