//! The explicit, ordered list of everything the composition root registers.
//!
//! Nothing registers itself as a side effect of being linked in; a module
//! takes part in bootstrap only by being declared here.

use std::sync::Arc;

use lectern_core::VersionMetadata;
use lectern_editor::EditorExtension;
use lectern_plugins::{Component, FilterFn, Plugin, Service};

use crate::application::{MountTarget, RootView};

#[derive(Debug, Clone, Copy, Default)]
pub struct BootOptions {
    /// Development diagnostics; off in production.
    pub verbose_diagnostics: bool,
}

/// The application's declared dependencies, by registered service name.
pub struct AppSpec {
    pub router: String,
    pub store: String,
    pub root: Arc<dyn RootView>,
}

pub struct BootManifest {
    pub options: BootOptions,
    pub version: VersionMetadata,
    pub editor_extensions: Vec<Arc<dyn EditorExtension>>,
    pub components: Vec<Component>,
    pub filters: Vec<(String, FilterFn)>,
    pub services: Vec<Arc<dyn Service>>,
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub app: AppSpec,
    pub target: MountTarget,
}

impl BootManifest {
    pub fn new(version: VersionMetadata, app: AppSpec, target: MountTarget) -> Self {
        Self {
            options: BootOptions::default(),
            version,
            editor_extensions: Vec::new(),
            components: Vec::new(),
            filters: Vec::new(),
            services: Vec::new(),
            plugins: Vec::new(),
            app,
            target,
        }
    }

    pub fn verbose_diagnostics(mut self, enabled: bool) -> Self {
        self.options.verbose_diagnostics = enabled;
        self
    }

    pub fn extension(mut self, extension: Arc<dyn EditorExtension>) -> Self {
        self.editor_extensions.push(extension);
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn filter(mut self, name: impl Into<String>, filter: FilterFn) -> Self {
        self.filters.push((name.into(), filter));
        self
    }

    pub fn service(mut self, service: Arc<dyn Service>) -> Self {
        self.services.push(service);
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Declared module names per step, in the order they will be registered.
    pub fn plan(&self) -> Vec<(&'static str, String)> {
        let mut plan = Vec::new();
        plan.extend(
            self.editor_extensions
                .iter()
                .map(|e| ("editor-extension", e.name().to_string())),
        );
        plan.extend(self.components.iter().map(|c| ("component", c.name.clone())));
        plan.extend(self.filters.iter().map(|(n, _)| ("filter", n.clone())));
        plan.extend(self.services.iter().map(|s| ("service", s.name().to_string())));
        plan.extend(self.plugins.iter().map(|p| ("plugin", p.name().to_string())));
        plan
    }
}
