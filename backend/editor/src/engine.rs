//! Editor engine bootstrap.
//!
//! Extensions may only be attached while the engine is idle. The first
//! `create_editor` call activates the engine and seals its registries; from
//! then on `attach_extension` fails with `EngineAlreadyActive`.

use anyhow::Context;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use lectern_core::{BootError, BootResult, CapabilityRegistry};

use crate::editor::{Editor, EditorConfig};
use crate::extension::{EditorExtension, ElementRenderer, ExtensionScope, MenuDef};

pub mod surfaces {
    pub const EXTENSIONS: &str = "editor.extensions";
    pub const MENUS: &str = "editor.menus";
    pub const ELEMENTS: &str = "editor.elements";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Accepting extensions.
    Idle,
    /// Handed out at least one editor; extension set is frozen.
    Active,
}

pub struct EditorEngine {
    extensions: CapabilityRegistry<Arc<dyn EditorExtension>>,
    menus: CapabilityRegistry<MenuDef>,
    elements: CapabilityRegistry<Arc<dyn ElementRenderer>>,
    /// Held across the attach re-check and commit, and across activation.
    state: Mutex<EngineState>,
}

impl EditorEngine {
    pub fn new() -> Self {
        Self {
            extensions: CapabilityRegistry::new(surfaces::EXTENSIONS),
            menus: CapabilityRegistry::new(surfaces::MENUS),
            elements: CapabilityRegistry::new(surfaces::ELEMENTS),
            state: Mutex::new(EngineState::Idle),
        }
    }

    pub fn state(&self) -> EngineState {
        *self.lock_state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == EngineState::Active
    }

    /// Attach an extension module. All of its menus and elements are
    /// registered, or none are.
    ///
    /// The install hook runs before the state lock is taken, so it may call
    /// back into the engine; the engine state and every staged name are
    /// re-checked under the lock before anything is committed.
    pub fn attach_extension(&self, extension: Arc<dyn EditorExtension>) -> BootResult<()> {
        let name = extension.name().to_string();
        self.check_attachable(self.state(), &name)?;

        let mut scope = ExtensionScope::new(&name);
        extension
            .install(&mut scope)
            .with_context(|| format!("Editor extension '{}' failed to install", name))?;

        let state = self.lock_state();
        self.check_attachable(*state, &name)?;
        let (menu_count, element_count) = (scope.menus.len(), scope.elements.len());
        self.menus
            .ensure_all_available(scope.menus.iter().map(|(key, _)| key.as_str()))?;
        self.elements
            .ensure_all_available(scope.elements.iter().map(|(kind, _)| kind.as_str()))?;
        self.menus.register_all(scope.menus)?;
        self.elements.register_all(scope.elements)?;
        self.extensions.register(&name, extension)?;

        info!(
            extension = %name,
            menus = menu_count,
            elements = element_count,
            "Editor extension attached"
        );
        Ok(())
    }

    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.names()
    }

    pub fn menu_keys(&self) -> Vec<String> {
        self.menus.names()
    }

    pub fn has_element(&self, kind: &str) -> bool {
        self.elements.contains(kind)
    }

    /// Create an editor instance. The first call activates the engine.
    pub fn create_editor(&self, config: EditorConfig) -> Editor {
        let mut state = self.lock_state();
        if *state == EngineState::Idle {
            *state = EngineState::Active;
            self.extensions.seal();
            self.menus.seal();
            self.elements.seal();
            info!(extensions = ?self.extensions.names(), "Editor engine activated");
        }
        debug!(placeholder = %config.placeholder, "Creating editor");
        Editor::new(config, self.menus.entries(), self.elements.entries())
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_attachable(&self, state: EngineState, name: &str) -> BootResult<()> {
        if state == EngineState::Active {
            return Err(BootError::EngineAlreadyActive {
                extension: name.to_string(),
            });
        }
        self.extensions.ensure_available(name)
    }
}

impl Default for EditorEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach `extension` to `engine`; see [`EditorEngine::attach_extension`].
pub fn attach_extension(engine: &EditorEngine, extension: Arc<dyn EditorExtension>) -> BootResult<()> {
    engine.attach_extension(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload_attachment::{UploadAttachmentConfig, UploadAttachmentExtension};
    use anyhow::Result;
    use serde_json::json;

    struct MentionExtension;

    impl EditorExtension for MentionExtension {
        fn name(&self) -> &str {
            "mention"
        }
        fn install(&self, scope: &mut ExtensionScope) -> Result<()> {
            scope.menu("insertMention", "Mention", None, json!({}));
            Ok(())
        }
    }

    /// Reuses the upload menu key under a different extension name.
    struct ShadowUploadExtension;

    impl EditorExtension for ShadowUploadExtension {
        fn name(&self) -> &str {
            "shadow-upload"
        }
        fn install(&self, scope: &mut ExtensionScope) -> Result<()> {
            scope
                .menu("shadowMenu", "Shadow", None, json!({}))
                .menu("uploadAttachment", "Upload", None, json!({}));
            Ok(())
        }
    }

    fn upload() -> Arc<dyn EditorExtension> {
        Arc::new(UploadAttachmentExtension::new(UploadAttachmentConfig::default()))
    }

    #[test]
    fn test_attach_then_create() {
        let engine = EditorEngine::new();
        attach_extension(&engine, upload()).unwrap();
        attach_extension(&engine, Arc::new(MentionExtension)).unwrap();

        assert_eq!(engine.extension_names(), vec!["upload-attachment", "mention"]);
        assert!(engine.has_element("attachment"));
        assert_eq!(engine.state(), EngineState::Idle);

        let editor = engine.create_editor(EditorConfig::default());
        assert!(engine.is_active());
        assert_eq!(editor.menu_keys(), vec!["uploadAttachment", "insertMention"]);
    }

    #[test]
    fn test_attach_after_first_use_fails() {
        let engine = EditorEngine::new();
        engine.attach_extension(upload()).unwrap();
        let _editor = engine.create_editor(EditorConfig::default());

        let err = engine.attach_extension(Arc::new(MentionExtension)).unwrap_err();
        assert!(matches!(err, BootError::EngineAlreadyActive { ref extension } if extension == "mention"));
        assert_eq!(engine.extension_names(), vec!["upload-attachment"]);
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let engine = EditorEngine::new();
        engine.attach_extension(upload()).unwrap();
        let err = engine.attach_extension(upload()).unwrap_err();
        assert!(matches!(err, BootError::DuplicateRegistration { ref surface, .. } if surface == surfaces::EXTENSIONS));
        assert_eq!(engine.menu_keys().len(), 1);
    }

    #[test]
    fn test_menu_key_clash_is_atomic() {
        let engine = EditorEngine::new();
        engine.attach_extension(upload()).unwrap();

        let err = engine
            .attach_extension(Arc::new(ShadowUploadExtension))
            .unwrap_err();
        assert!(matches!(err, BootError::DuplicateRegistration { ref name, .. } if name == "uploadAttachment"));
        assert_eq!(engine.menu_keys(), vec!["uploadAttachment"]);
        assert_eq!(engine.extension_names(), vec!["upload-attachment"]);
    }

    /// Reads engine state from inside its own install hook.
    struct IntrospectingExtension {
        engine: Arc<EditorEngine>,
    }

    impl EditorExtension for IntrospectingExtension {
        fn name(&self) -> &str {
            "introspect"
        }
        fn install(&self, scope: &mut ExtensionScope) -> Result<()> {
            let title = format!("Extensions: {}", self.engine.extension_names().len());
            assert!(!self.engine.is_active());
            scope.menu("introspect", &title, None, json!({}));
            Ok(())
        }
    }

    #[test]
    fn test_install_hook_may_call_back_into_engine() {
        let engine = Arc::new(EditorEngine::new());
        engine.attach_extension(upload()).unwrap();
        engine
            .attach_extension(Arc::new(IntrospectingExtension {
                engine: engine.clone(),
            }))
            .unwrap();

        assert_eq!(engine.menu_keys(), vec!["uploadAttachment", "introspect"]);
        let editor = engine.create_editor(EditorConfig::default());
        assert_eq!(editor.menu_keys(), vec!["uploadAttachment", "introspect"]);
    }

    /// Activates the engine from inside its install hook.
    struct ActivatingExtension {
        engine: Arc<EditorEngine>,
    }

    impl EditorExtension for ActivatingExtension {
        fn name(&self) -> &str {
            "activating"
        }
        fn install(&self, scope: &mut ExtensionScope) -> Result<()> {
            let _ = self.engine.create_editor(EditorConfig::default());
            scope.menu("late", "Late", None, json!({}));
            Ok(())
        }
    }

    #[test]
    fn test_activation_during_install_rejects_the_extension() {
        let engine = Arc::new(EditorEngine::new());
        let err = engine
            .attach_extension(Arc::new(ActivatingExtension {
                engine: engine.clone(),
            }))
            .unwrap_err();

        assert!(matches!(err, BootError::EngineAlreadyActive { ref extension } if extension == "activating"));
        assert!(engine.menu_keys().is_empty());
        assert!(engine.extension_names().is_empty());
    }

    #[test]
    fn test_second_create_does_not_reactivate() {
        let engine = EditorEngine::new();
        let first = engine.create_editor(EditorConfig::default());
        let second = engine.create_editor(EditorConfig::default());
        assert!(first.menu_keys().is_empty());
        assert!(second.menu_keys().is_empty());
        assert!(engine.is_active());
    }
}
