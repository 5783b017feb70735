//! `lectern-config`: configuration for the Lectern bootstrap.
//!
//! Provides:
//! - Typed config schema (boot options, logging, plugins, editor uploads)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, load_raw_config, write_config, CONFIG_DIR_ENV};
pub use schema::{EditorSection, LecternConfig, LoggingConfig, PluginsConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load a config file for runtime use: read, substitute env vars, apply
/// defaults, validate. Validation errors reject the config; warnings are
/// logged.
pub async fn load_and_prepare(path: &Path) -> Result<LecternConfig> {
    let raw = load_raw_config(path).await?;
    resolve_env_vars(&raw)
        .context("Failed to resolve env vars in config")
        .and_then(prepare)
        .with_context(|| format!("Config at {} rejected", path.display()))
}

/// [`load_and_prepare`] with an explicit environment.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<LecternConfig> {
    let raw = load_raw_config(path).await?;
    resolve_env_vars_with(&raw, env)
        .context("Failed to resolve env vars in config")
        .and_then(prepare)
        .with_context(|| format!("Config at {} rejected", path.display()))
}

fn prepare(value: Value) -> Result<LecternConfig> {
    let config: LecternConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("Invalid config: {}", report.summary());
    }

    Ok(config)
}
