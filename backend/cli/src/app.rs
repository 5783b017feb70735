//! Turns a prepared config into the boot manifest for the Lectern app.

use anyhow::{Context, Result};
use chrono::DateTime;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use lectern_boot::{AppSpec, AppView, BootManifest, MountTarget};
use lectern_config::LecternConfig;
use lectern_core::VersionMetadata;
use lectern_editor::{EditorConfig, UploadAttachmentExtension};
use lectern_plugins::{ContextMenuPlugin, Router, RouterPlugin, Store};

pub const ROUTER_NAME: &str = "app-router";
pub const STORE_NAME: &str = "app-store";

pub fn app_router() -> Router {
    Router::new(ROUTER_NAME)
        .with_route("/", "Home")
        .with_route("/documents", "Documents")
        .with_route("/settings", "Settings")
}

pub fn app_store() -> Store {
    Store::new(STORE_NAME)
        .with_state("documents", json!([]))
        .with_state("user", json!(null))
}

/// Version metadata from the manifest at `path`, or this build's version.
pub async fn load_version(path: &Path) -> Result<VersionMetadata> {
    let fallback = VersionMetadata::new(Some("lectern".into()), env!("CARGO_PKG_VERSION"))?;
    Ok(VersionMetadata::load_or(path, fallback).await?)
}

/// Declared modules, in registration order:
/// upload extension, filters, store, router plugin, context-menu plugin.
pub fn build_manifest(
    config: &LecternConfig,
    version: VersionMetadata,
    target: Option<&str>,
) -> Result<BootManifest> {
    let target = MountTarget::parse(target.unwrap_or(config.mount_target()))
        .context("Invalid mount target")?;

    let editor = EditorConfig {
        placeholder: config.editor_placeholder().to_string(),
        ..Default::default()
    };
    let app = AppSpec {
        router: ROUTER_NAME.to_string(),
        store: STORE_NAME.to_string(),
        root: Arc::new(AppView::new("/", editor)),
    };

    let mut manifest = BootManifest::new(version, app, target)
        .verbose_diagnostics(config.verbose_diagnostics());

    if let Some(upload) = config.upload_attachment() {
        manifest = manifest.extension(Arc::new(UploadAttachmentExtension::new(upload.clone())));
    }

    manifest = manifest
        .filter("uppercase", Arc::new(|s: &str| s.to_uppercase()))
        .filter("date", Arc::new(format_date))
        .service(Arc::new(app_store()))
        .plugin(Arc::new(RouterPlugin::new(Arc::new(app_router()))));

    if config.context_menu_enabled() {
        manifest = manifest.plugin(Arc::new(ContextMenuPlugin::default()));
    }

    Ok(manifest)
}

/// RFC 3339 timestamps as `YYYY-MM-DD`; anything else unchanged.
fn format_date(input: &str) -> String {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| input.to_string())
}
