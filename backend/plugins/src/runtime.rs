//! Framework runtime: the registration surfaces plugins install into.
//!
//! Registries are append-only until [`Runtime::seal`]; after that every
//! registration fails with `RegistrySealed`.

use anyhow::Context;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use lectern_core::{BootError, BootResult, CapabilityRegistry};

use crate::plugin::{Component, FilterFn, InstallScope, Plugin};
use crate::services::{Service, ServiceKind};

/// Surface names, as they appear in errors and logs.
pub mod surfaces {
    pub const PLUGINS: &str = "plugins";
    pub const SERVICES: &str = "services";
    pub const COMPONENTS: &str = "components";
    pub const FILTERS: &str = "filters";
    pub const GLOBALS: &str = "globals";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    /// When false, development-mode tips and warnings are suppressed.
    pub verbose_diagnostics: bool,
}

pub struct Runtime {
    plugins: CapabilityRegistry<Arc<dyn Plugin>>,
    services: CapabilityRegistry<Arc<dyn Service>>,
    components: CapabilityRegistry<Component>,
    filters: CapabilityRegistry<FilterFn>,
    globals: CapabilityRegistry<Value>,
    verbose: AtomicBool,
    /// Serializes multi-registry commits so a plugin's contributions land
    /// all together or not at all.
    install_lock: Mutex<()>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            plugins: CapabilityRegistry::new(surfaces::PLUGINS),
            services: CapabilityRegistry::new(surfaces::SERVICES),
            components: CapabilityRegistry::new(surfaces::COMPONENTS),
            filters: CapabilityRegistry::new(surfaces::FILTERS),
            globals: CapabilityRegistry::new(surfaces::GLOBALS),
            verbose: AtomicBool::new(false),
            install_lock: Mutex::new(()),
        }
    }

    pub fn configure(&self, config: RuntimeConfig) {
        self.verbose.store(config.verbose_diagnostics, Ordering::SeqCst);
        debug!(verbose = config.verbose_diagnostics, "Runtime configured");
    }

    pub fn verbose_diagnostics(&self) -> bool {
        self.verbose.load(Ordering::SeqCst)
    }

    /// Log a development-mode tip; silent unless verbose diagnostics are on.
    /// Returns whether the tip was emitted.
    pub fn tip(&self, message: &str) -> bool {
        if !self.verbose_diagnostics() {
            return false;
        }
        info!(target: "lectern::tips", "{}", message);
        true
    }

    /// Install a framework plugin exactly once.
    ///
    /// The install hook runs before `install_lock` is taken, so it may call
    /// back into the runtime. Its staged contributions are re-checked and
    /// committed under the lock.
    pub fn use_plugin(&self, plugin: Arc<dyn Plugin>) -> BootResult<()> {
        let name = plugin.name().to_string();
        self.check_installable(&name)?;

        let mut scope = InstallScope::new(&name);
        plugin
            .install(&mut scope)
            .with_context(|| format!("Plugin '{}' failed to install", name))?;

        let _guard = self.lock_installs();
        self.check_installable(&name)?;
        self.commit(scope)?;
        self.plugins.register(&name, plugin)?;
        info!(plugin = %name, "Plugin installed");
        Ok(())
    }

    pub fn is_installed(&self, plugin: &str) -> bool {
        self.plugins.contains(plugin)
    }

    /// Installed plugin names, in install order.
    pub fn installed_plugins(&self) -> Vec<String> {
        self.plugins.names()
    }

    /// Register a service that is not itself a plugin (e.g. the store).
    pub fn register_service(&self, service: Arc<dyn Service>) -> BootResult<()> {
        let _guard = self.lock_installs();
        let name = service.name().to_string();
        let kind = service.kind();
        self.services.register(&name, service)?;
        info!(service = %name, kind = %kind, "Service registered");
        Ok(())
    }

    /// Look up a service by name, requiring it to play `kind`.
    pub fn service(&self, name: &str, kind: ServiceKind) -> Option<Arc<dyn Service>> {
        self.services.get(name).filter(|s| s.kind() == kind)
    }

    pub fn register_component(&self, component: Component) -> BootResult<()> {
        let _guard = self.lock_installs();
        self.components.register(component.name.clone(), component)
    }

    pub fn component(&self, name: &str) -> Option<Component> {
        self.components.get(name)
    }

    pub fn components(&self) -> Vec<Component> {
        self.components.entries().into_iter().map(|(_, c)| c).collect()
    }

    pub fn register_filter(&self, name: impl Into<String>, filter: FilterFn) -> BootResult<()> {
        let _guard = self.lock_installs();
        self.filters.register(name, filter)
    }

    /// Apply a named filter; unknown filters pass the input through unchanged.
    pub fn apply_filter(&self, name: &str, input: &str) -> String {
        match self.filters.get(name) {
            Some(filter) => filter(input),
            None => {
                self.tip(&format!("Unknown filter '{}'", name));
                input.to_string()
            }
        }
    }

    pub fn filter_names(&self) -> Vec<String> {
        self.filters.names()
    }

    /// Inject a read-only global value. Each key can be set once.
    pub fn inject_global(&self, key: impl Into<String>, value: Value) -> BootResult<()> {
        let _guard = self.lock_installs();
        let key = key.into();
        self.globals.register(&key, value)?;
        debug!(key = %key, "Global injected");
        Ok(())
    }

    pub fn global(&self, key: &str) -> Option<Value> {
        self.globals.get(key)
    }

    /// Switch every surface to read-only. Waits for an in-flight commit, so a
    /// plugin is never left half registered.
    pub fn seal(&self) {
        let _guard = self.lock_installs();
        self.plugins.seal();
        self.services.seal();
        self.components.seal();
        self.filters.seal();
        self.globals.seal();
    }

    pub fn is_sealed(&self) -> bool {
        self.plugins.is_sealed()
    }

    fn lock_installs(&self) -> MutexGuard<'_, ()> {
        self.install_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_installable(&self, name: &str) -> BootResult<()> {
        if self.plugins.contains(name) {
            return Err(BootError::PluginAlreadyInstalled(name.to_string()));
        }
        self.plugins.ensure_available(name)
    }

    /// Commit staged contributions. Every entry is checked before any is
    /// written; the caller holds `install_lock`.
    fn commit(&self, scope: InstallScope) -> BootResult<()> {
        let owner = scope.owner().to_string();
        self.services.ensure_all_available(staged_names(&scope.services))?;
        self.components.ensure_all_available(staged_names(&scope.components))?;
        self.filters.ensure_all_available(staged_names(&scope.filters))?;
        self.globals.ensure_all_available(staged_names(&scope.globals))?;

        let staged = scope.len();
        self.services.register_all(scope.services)?;
        self.components.register_all(scope.components)?;
        self.filters.register_all(scope.filters)?;
        self.globals.register_all(scope.globals)?;
        debug!(plugin = %owner, contributions = staged, "Committed plugin contributions");
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

fn staged_names<T>(batch: &[(String, T)]) -> impl Iterator<Item = &str> {
    batch.iter().map(|(name, _)| name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_menu::ContextMenuPlugin;
    use crate::services::{Router, RouterPlugin, Store};
    use anyhow::{bail, Result};
    use serde_json::json;
    use std::sync::Barrier;

    struct ClashingPlugin;

    impl Plugin for ClashingPlugin {
        fn name(&self) -> &str {
            "clashing"
        }
        fn install(&self, scope: &mut InstallScope) -> Result<()> {
            scope
                .component("fresh-component", "<x-fresh/>")
                .component("router-view", "<x-clash/>");
            Ok(())
        }
    }

    struct FailingPlugin;

    impl Plugin for FailingPlugin {
        fn name(&self) -> &str {
            "failing"
        }
        fn install(&self, scope: &mut InstallScope) -> Result<()> {
            scope.global("half", json!(true));
            bail!("missing host capability")
        }
    }

    #[test]
    fn test_plugin_installs_once() {
        let runtime = Runtime::new();
        runtime.use_plugin(Arc::new(ContextMenuPlugin::default())).unwrap();

        let err = runtime
            .use_plugin(Arc::new(ContextMenuPlugin::default()))
            .unwrap_err();
        assert!(matches!(err, BootError::PluginAlreadyInstalled(ref n) if n == "context-menu"));
        assert_eq!(runtime.installed_plugins(), vec!["context-menu"]);
        assert_eq!(runtime.components().len(), 1);
    }

    #[test]
    fn test_router_plugin_registers_service() {
        let runtime = Runtime::new();
        runtime
            .use_plugin(Arc::new(RouterPlugin::new(Arc::new(Router::new("R1")))))
            .unwrap();
        assert!(runtime.service("R1", ServiceKind::Router).is_some());
        assert!(runtime.service("R1", ServiceKind::Store).is_none());
        assert!(runtime.component("router-view").is_some());
    }

    #[test]
    fn test_conflicting_contribution_leaves_runtime_unchanged() {
        let runtime = Runtime::new();
        runtime
            .use_plugin(Arc::new(RouterPlugin::new(Arc::new(Router::new("R1")))))
            .unwrap();

        let err = runtime.use_plugin(Arc::new(ClashingPlugin)).unwrap_err();
        assert!(matches!(err, BootError::DuplicateRegistration { ref name, .. } if name == "router-view"));
        assert!(runtime.component("fresh-component").is_none());
        assert!(!runtime.is_installed("clashing"));
    }

    #[test]
    fn test_failing_install_commits_nothing() {
        let runtime = Runtime::new();
        let err = runtime.use_plugin(Arc::new(FailingPlugin)).unwrap_err();
        assert!(err.to_string().contains("failing"));
        assert!(runtime.global("half").is_none());
        assert!(!runtime.is_installed("failing"));
    }

    #[test]
    fn test_globals_are_write_once() {
        let runtime = Runtime::new();
        runtime.inject_global("VERSION", json!("1.2.3")).unwrap();
        let err = runtime.inject_global("VERSION", json!("9.9.9")).unwrap_err();
        assert!(matches!(err, BootError::DuplicateRegistration { .. }));
        assert_eq!(runtime.global("VERSION"), Some(json!("1.2.3")));
    }

    #[test]
    fn test_filters() {
        let runtime = Runtime::new();
        runtime
            .register_filter("upper", Arc::new(|s: &str| s.to_uppercase()))
            .unwrap();
        assert_eq!(runtime.apply_filter("upper", "draft"), "DRAFT");
        assert_eq!(runtime.apply_filter("unknown", "draft"), "draft");
    }

    #[test]
    fn test_sealed_runtime_rejects_everything() {
        let runtime = Runtime::new();
        runtime.register_service(Arc::new(Store::new("S1"))).unwrap();
        runtime.seal();

        assert!(matches!(
            runtime.register_service(Arc::new(Store::new("S2"))),
            Err(BootError::RegistrySealed { .. })
        ));
        assert!(matches!(
            runtime.use_plugin(Arc::new(ContextMenuPlugin::default())),
            Err(BootError::RegistrySealed { .. })
        ));
        assert!(runtime.inject_global("late", json!(1)).is_err());
        assert!(runtime.service("S1", ServiceKind::Store).is_some());
    }

    #[test]
    fn test_verbose_flag_gates_tips() {
        let runtime = Runtime::new();
        assert!(!runtime.verbose_diagnostics());
        assert!(!runtime.tip("production tip"));

        runtime.configure(RuntimeConfig { verbose_diagnostics: true });
        assert!(runtime.verbose_diagnostics());
        assert!(runtime.tip("development tip"));

        runtime.configure(RuntimeConfig { verbose_diagnostics: false });
        assert!(!runtime.tip("production tip"));
    }

    /// Contributes a store and a view, both keyed by its index.
    struct PairPlugin {
        index: usize,
        name: String,
    }

    impl PairPlugin {
        fn new(index: usize) -> Self {
            Self {
                index,
                name: format!("pair-{index}"),
            }
        }
    }

    impl Plugin for PairPlugin {
        fn name(&self) -> &str {
            &self.name
        }
        fn install(&self, scope: &mut InstallScope) -> Result<()> {
            scope
                .provide_service(Arc::new(Store::new(format!("store-{}", self.index))))
                .component(format!("view-{}", self.index), "<div></div>");
            Ok(())
        }
    }

    #[test]
    fn test_seal_racing_installs_never_splits_a_plugin() {
        let runtime = Runtime::new();
        let barrier = Barrier::new(2);
        let count = 64;

        std::thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                runtime.seal();
            });
            barrier.wait();
            for i in 0..count {
                let _ = runtime.use_plugin(Arc::new(PairPlugin::new(i)));
            }
        });

        assert!(runtime.is_sealed());
        for i in 0..count {
            let installed = runtime.is_installed(&format!("pair-{i}"));
            let has_store = runtime
                .service(&format!("store-{i}"), ServiceKind::Store)
                .is_some();
            let has_view = runtime.component(&format!("view-{i}")).is_some();
            assert_eq!(has_store, installed, "store of pair-{i}");
            assert_eq!(has_view, installed, "view of pair-{i}");
        }
    }

    /// Calls back into the runtime from its install hook.
    struct ReentrantPlugin {
        runtime: Arc<Runtime>,
    }

    impl Plugin for ReentrantPlugin {
        fn name(&self) -> &str {
            "reentrant"
        }
        fn install(&self, scope: &mut InstallScope) -> Result<()> {
            if !self.runtime.is_installed("router") {
                bail!("router plugin required");
            }
            self.runtime.register_filter("trim", Arc::new(|s: &str| s.trim().to_string()))?;
            scope.component("reentrant-view", "<div></div>");
            Ok(())
        }
    }

    #[test]
    fn test_install_hook_may_call_back_into_runtime() {
        let runtime = Arc::new(Runtime::new());
        runtime
            .use_plugin(Arc::new(RouterPlugin::new(Arc::new(Router::new("R1")))))
            .unwrap();
        runtime
            .use_plugin(Arc::new(ReentrantPlugin {
                runtime: runtime.clone(),
            }))
            .unwrap();

        assert!(runtime.is_installed("reentrant"));
        assert_eq!(runtime.apply_filter("trim", "  a "), "a");
        assert!(runtime.component("reentrant-view").is_some());
    }

    #[test]
    fn test_hook_that_seals_runtime_commits_nothing() {
        struct SealingPlugin(Arc<Runtime>);

        impl Plugin for SealingPlugin {
            fn name(&self) -> &str {
                "sealing"
            }
            fn install(&self, scope: &mut InstallScope) -> Result<()> {
                scope.component("sealing-view", "<div></div>");
                self.0.seal();
                Ok(())
            }
        }

        let runtime = Arc::new(Runtime::new());
        let err = runtime
            .use_plugin(Arc::new(SealingPlugin(runtime.clone())))
            .unwrap_err();
        assert!(matches!(err, BootError::RegistrySealed { .. }));
        assert!(runtime.component("sealing-view").is_none());
        assert!(!runtime.is_installed("sealing"));
    }
}
