//! Configuration loading for the CLI.

use anyhow::{Context, Result};
use canopy_core::config::AppConfig;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::path::Path;

/// Prefix for environment overrides, e.g. `CANOPY_INDEX__PATH`.
pub const ENV_PREFIX: &str = "CANOPY_";

/// Load configuration from an optional TOML file, then environment overrides.
///
/// A missing file is not an error; defaults fill whatever neither source sets.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if path.exists() {
        tracing::debug!(config_path = %path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!(config_path = %path.display(), "No config file found");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;
    Ok(config)
}
