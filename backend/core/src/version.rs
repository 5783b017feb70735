//! Build/version metadata, read once from a packaging manifest and exposed
//! read-only to the running application.

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{BootError, BootResult};

/// `MAJOR.MINOR.PATCH` with optional `-prerelease` and `+build` suffixes.
static SEMVER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$")
        .unwrap()
});

/// The subset of a packaging manifest (e.g. `package.json`) we read.
#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    name: Option<String>,
    version: String,
}

/// Immutable version record. Fields are private so nothing can mutate it
/// after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionMetadata {
    name: Option<String>,
    version: String,
}

impl VersionMetadata {
    /// Build a record, validating the version string.
    pub fn new(name: Option<String>, version: impl Into<String>) -> BootResult<Self> {
        let version = version.into();
        if !SEMVER_PATTERN.is_match(version.trim()) {
            return Err(BootError::InvalidVersion(version));
        }
        Ok(Self {
            name,
            version: version.trim().to_string(),
        })
    }

    /// Parse a JSON packaging manifest with a top-level `version` field.
    pub fn from_manifest_str(raw: &str) -> BootResult<Self> {
        let manifest: PackageManifest =
            serde_json::from_str(raw).context("Failed to parse version manifest")?;
        Self::new(manifest.name, manifest.version)
    }

    /// Load the manifest at `path`.
    pub async fn load(path: &Path) -> BootResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read version manifest: {}", path.display()))?;
        let meta = Self::from_manifest_str(&raw)?;
        info!(path = %path.display(), version = %meta.version, "Loaded version metadata");
        Ok(meta)
    }

    /// Load the manifest at `path`, or fall back to `fallback` when the file
    /// does not exist. A manifest that exists but is invalid is still an error.
    pub async fn load_or(path: &Path, fallback: VersionMetadata) -> BootResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Version manifest absent; using build version");
            return Ok(fallback);
        }
        Self::load(path).await
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl std::fmt::Display for VersionMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} v{}", name, self.version),
            None => write!(f, "v{}", self.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_package_manifest() {
        let raw = r#"{"name": "lectern-web", "version": "2.4.1", "private": true}"#;
        let meta = VersionMetadata::from_manifest_str(raw).unwrap();
        assert_eq!(meta.version(), "2.4.1");
        assert_eq!(meta.name(), Some("lectern-web"));
        assert_eq!(meta.to_string(), "lectern-web v2.4.1");
    }

    #[test]
    fn test_accepts_prerelease_and_build() {
        assert!(VersionMetadata::new(None, "1.0.0-beta.2+exp.sha.5114f85").is_ok());
    }

    #[test]
    fn test_rejects_bad_versions() {
        for bad in ["", "1.0", "v1.0.0", "01.2.3", "latest"] {
            let err = VersionMetadata::new(None, bad).unwrap_err();
            assert!(matches!(err, BootError::InvalidVersion(_)), "{bad}");
        }
    }

    #[test]
    fn test_missing_version_field_is_error() {
        let err = VersionMetadata::from_manifest_str(r#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, BootError::Other(_)));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        tokio::fs::write(&path, r#"{"version": "0.9.3"}"#).await.unwrap();

        let meta = VersionMetadata::load(&path).await.unwrap();
        assert_eq!(meta.version(), "0.9.3");
        assert_eq!(meta.name(), None);
    }

    #[tokio::test]
    async fn test_load_or_falls_back_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = VersionMetadata::new(Some("lectern".into()), "0.1.0").unwrap();
        let meta = VersionMetadata::load_or(&dir.path().join("nope.json"), fallback.clone())
            .await
            .unwrap();
        assert_eq!(meta, fallback);
    }
}
