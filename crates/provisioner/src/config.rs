//! CLI configuration: thin wrapper around `provisioner_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --insecure, --timeout, --output, --color).

use std::time::Duration;

use clap::ValueEnum;

use provisioner_config::{Config, ConfigError, Defaults, config_path, parse_refresh};
use provisioner_core::{ProvisionerConfig, TlsVerification};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Fill `--output` / `--color` from the config file's `[defaults]` when the
/// flags were not given.
pub fn apply_defaults(global: &mut GlobalOpts, defaults: &Defaults) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_choice::<OutputFormat>("output", &defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_choice::<ColorMode>("color", &defaults.color)?);
    }
    Ok(())
}

fn parse_choice<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: format!("defaults.{field}"),
        reason,
    })
}

/// Build a `ProvisionerConfig` from the loaded config, profile, and CLI flags.
///
/// Flag overrides take priority over profile values. Without a matching
/// profile, `--url` alone is enough.
pub fn build_provisioner_config(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<ProvisionerConfig, CliError> {
    let mut resolved = match cfg.profile(global.profile.as_deref()) {
        Ok((_, profile)) => profile.to_provisioner_config(&cfg.defaults)?,
        Err(ConfigError::UnknownProfile { name }) if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        Err(_) => {
            let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let mut base = ProvisionerConfig::new(parse_url(url_str)?);
            base.timeout = Duration::from_secs(cfg.defaults.timeout);
            base.refresh = parse_refresh(&cfg.defaults.refresh)?;
            if cfg.defaults.insecure {
                base.tls = TlsVerification::DangerAcceptInvalid;
            }
            base
        }
    };

    if let Some(ref url_str) = global.url {
        resolved.url = parse_url(url_str)?;
    }
    if global.insecure {
        resolved.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        resolved.timeout = Duration::from_secs(secs);
    }

    Ok(resolved)
}

fn parse_url(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
