//! Config file read/write with atomic backup rotation.

use crate::schema::LecternConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 5;

pub const CONFIG_DIR_ENV: &str = "LECTERN_CONFIG_DIR";

/// Resolve the config directory: `LECTERN_CONFIG_DIR`, else `~/.lectern`.
pub fn config_dir() -> PathBuf {
    config_dir_from(std::env::var(CONFIG_DIR_ENV).ok(), dirs::home_dir())
}

fn config_dir_from(env_dir: Option<String>, home: Option<PathBuf>) -> PathBuf {
    match (env_dir.filter(|d| !d.trim().is_empty()), home) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(home)) => home.join(".lectern"),
        (None, None) => PathBuf::from(".lectern"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the config file as an untyped tree, so `${VAR}` references can be
/// resolved before field types are checked. A missing file is an empty tree.
pub async fn load_raw_config(path: &Path) -> Result<serde_json::Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value)
}

/// Load and parse the config as written, without substitution or defaults.
pub async fn load_config(path: &Path) -> Result<LecternConfig> {
    let value = load_raw_config(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))
}

/// Write config atomically (temp file, then rename), keeping a rolling
/// backup of the previous file.
pub async fn write_config(config: &LecternConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if fs::try_exists(path).await.unwrap_or(false) {
        rotate_backups(path).await;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    path.with_extension(format!("yaml.bak.{n}"))
}

/// config.yaml.bak.1 → .bak.2 → … → .bak.N, then copy the current file to .bak.1.
async fn rotate_backups(path: &Path) {
    for i in (1..MAX_BACKUPS).rev() {
        let old = backup_path(path, i);
        if fs::try_exists(&old).await.unwrap_or(false) {
            if let Err(e) = fs::rename(&old, backup_path(path, i + 1)).await {
                warn!(backup = %old.display(), error = %e, "Failed to rotate config backup");
            }
        }
    }

    let bak = backup_path(path, 1);
    if let Err(e) = fs::copy(path, &bak).await {
        warn!(backup = %bak.display(), error = %e, "Failed to create config backup");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PluginsConfig;

    #[test]
    fn config_dir_prefers_env() {
        let dir = config_dir_from(Some("/etc/lectern".into()), Some(PathBuf::from("/home/u")));
        assert_eq!(dir, PathBuf::from("/etc/lectern"));
        let dir = config_dir_from(Some("  ".into()), Some(PathBuf::from("/home/u")));
        assert_eq!(dir, PathBuf::from("/home/u/.lectern"));
        assert_eq!(config_dir_from(None, None), PathBuf::from(".lectern"));
    }

    #[tokio::test]
    async fn missing_file_loads_empty_config() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_config(&tmp.path().join("config.yaml")).await.unwrap();
        assert_eq!(cfg, LecternConfig::default());
    }

    #[tokio::test]
    async fn empty_file_loads_empty_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(load_config(&path).await.unwrap(), LecternConfig::default());
    }

    #[tokio::test]
    async fn write_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = config_file_path(&tmp.path().join("nested"));
        let cfg = LecternConfig {
            mount_target: Some("#root".into()),
            plugins: Some(PluginsConfig {
                context_menu: Some(false),
            }),
            ..Default::default()
        };
        write_config(&cfg, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("mountTarget"));
        assert!(raw.contains("contextMenu: false"));
        assert_eq!(load_config(&path).await.unwrap(), cfg);
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[tokio::test]
    async fn rewrites_keep_bounded_backups() {
        let tmp = tempfile::tempdir().unwrap();
        let path = config_file_path(tmp.path());
        for i in 0..(MAX_BACKUPS + 3) {
            let cfg = LecternConfig {
                manifest_path: Some(format!("manifest-{i}.json")),
                ..Default::default()
            };
            write_config(&cfg, &path).await.unwrap();
        }

        let newest = std::fs::read_to_string(backup_path(&path, 1)).unwrap();
        assert!(newest.contains(&format!("manifest-{}.json", MAX_BACKUPS + 1)));
        assert!(backup_path(&path, MAX_BACKUPS).exists());
        assert!(!backup_path(&path, MAX_BACKUPS + 1).exists());
    }

    #[tokio::test]
    async fn malformed_yaml_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "mountTarget: [unclosed").unwrap();
        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }
}
