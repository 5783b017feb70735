//! Config defaults: fills in values the file leaves out.

use lectern_editor::UploadAttachmentConfig;

use crate::schema::{EditorSection, LecternConfig, LoggingConfig, PluginsConfig};

pub const DEFAULT_MOUNT_TARGET: &str = "#app";

pub const DEFAULT_MANIFEST_PATH: &str = "package.json";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: LecternConfig) -> LecternConfig {
    let config = apply_boot_defaults(config);
    let config = apply_logging_defaults(config);
    let config = apply_plugin_defaults(config);
    apply_editor_defaults(config)
}

fn apply_boot_defaults(mut config: LecternConfig) -> LecternConfig {
    config.verbose_diagnostics.get_or_insert(false);
    config
        .mount_target
        .get_or_insert_with(|| DEFAULT_MOUNT_TARGET.to_string());
    config
        .manifest_path
        .get_or_insert_with(|| DEFAULT_MANIFEST_PATH.to_string());
    config
}

fn apply_logging_defaults(mut config: LecternConfig) -> LecternConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

/// The context-menu plugin is on unless switched off.
fn apply_plugin_defaults(mut config: LecternConfig) -> LecternConfig {
    let plugins = config.plugins.get_or_insert_with(PluginsConfig::default);
    plugins.context_menu.get_or_insert(true);
    config
}

/// The upload-attachment extension is attached with stock limits unless
/// configured.
fn apply_editor_defaults(mut config: LecternConfig) -> LecternConfig {
    let editor = config.editor.get_or_insert_with(EditorSection::default);
    editor
        .upload_attachment
        .get_or_insert_with(UploadAttachmentConfig::default);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_empty_config() {
        let cfg = apply_all_defaults(LecternConfig::default());
        assert_eq!(cfg.verbose_diagnostics, Some(false));
        assert_eq!(cfg.mount_target.as_deref(), Some("#app"));
        assert_eq!(cfg.manifest_path.as_deref(), Some("package.json"));
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("info"));
        assert_eq!(cfg.plugins.unwrap().context_menu, Some(true));
        assert_eq!(
            cfg.editor.unwrap().upload_attachment,
            Some(UploadAttachmentConfig::default())
        );
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = LecternConfig {
            mount_target: Some("#root".to_string()),
            plugins: Some(PluginsConfig {
                context_menu: Some(false),
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.mount_target(), "#root");
        assert!(!cfg.context_menu_enabled());
    }
}
