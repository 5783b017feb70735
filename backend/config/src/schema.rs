//! Lectern configuration schema.
//!
//! Every field is optional on disk; [`crate::apply_all_defaults`] fills in
//! what the file leaves out.

use lectern_editor::UploadAttachmentConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LecternConfig {
    /// Development tips and warnings; keep off in production.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_diagnostics: Option<bool>,

    /// Selector of the host element the app mounts into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_target: Option<String>,

    /// JSON manifest the version string is read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<PluginsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Default filter level; `RUST_LOG` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for rolling JSON log files. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_menu: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_attachment: Option<UploadAttachmentConfig>,
}

impl LecternConfig {
    pub fn verbose_diagnostics(&self) -> bool {
        self.verbose_diagnostics.unwrap_or(false)
    }

    pub fn mount_target(&self) -> &str {
        self.mount_target
            .as_deref()
            .unwrap_or(crate::defaults::DEFAULT_MOUNT_TARGET)
    }

    pub fn manifest_path(&self) -> &str {
        self.manifest_path
            .as_deref()
            .unwrap_or(crate::defaults::DEFAULT_MANIFEST_PATH)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(crate::defaults::DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }

    pub fn context_menu_enabled(&self) -> bool {
        self.plugins
            .as_ref()
            .and_then(|p| p.context_menu)
            .unwrap_or(true)
    }

    pub fn editor_placeholder(&self) -> &str {
        self.editor
            .as_ref()
            .and_then(|e| e.placeholder.as_deref())
            .unwrap_or_default()
    }

    /// Upload settings, or `None` when the extension is not configured.
    pub fn upload_attachment(&self) -> Option<&UploadAttachmentConfig> {
        self.editor.as_ref().and_then(|e| e.upload_attachment.as_ref())
    }
}
