//! Composition root.
//!
//! Runs the bootstrap in a fixed order:
//!
//! 1. apply diagnostics options
//! 2. inject version metadata as the `VERSION` global
//! 3. attach editor extensions, register components/filters/services,
//!    install framework plugins (→ `PluginsInstalled`)
//! 4. construct the application from its declared router and store (→ `Constructed`)
//! 5. mount once, then seal every registry (→ `Mounted`)
//!
//! Any error aborts the bootstrap; the root keeps the last state it reached
//! and refuses to continue.

use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use lectern_core::{BootError, BootResult, BootState, BootStateMachine};
use lectern_editor::EditorEngine;
use lectern_logging::{BootEvent, BootEventLogger};
use lectern_plugins::{surfaces, Runtime, RuntimeConfig, ServiceKind};

use crate::application::{Application, VERSION_GLOBAL};
use crate::manifest::BootManifest;

pub struct CompositionRoot {
    manifest: BootManifest,
    runtime: Arc<Runtime>,
    engine: Arc<EditorEngine>,
    state: BootStateMachine,
    app: Option<Application>,
    failed_at: Option<BootState>,
}

impl CompositionRoot {
    pub fn new(manifest: BootManifest) -> Self {
        Self::with_engine(manifest, Arc::new(EditorEngine::new()))
    }

    /// Use an existing engine, e.g. one shared with other hosts.
    pub fn with_engine(manifest: BootManifest, engine: Arc<EditorEngine>) -> Self {
        Self {
            manifest,
            runtime: Arc::new(Runtime::new()),
            engine,
            state: BootStateMachine::new(),
            app: None,
            failed_at: None,
        }
    }

    pub fn state(&self) -> BootState {
        self.state.current()
    }

    pub fn history(&self) -> &[BootState] {
        self.state.history()
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn engine(&self) -> &Arc<EditorEngine> {
        &self.engine
    }

    /// The application, once constructed by a bootstrap that has not failed.
    pub fn application(&self) -> Option<&Application> {
        if self.failed_at.is_some() {
            return None;
        }
        self.app.as_ref()
    }

    pub fn has_failed(&self) -> bool {
        self.failed_at.is_some()
    }

    /// Run every remaining step in order and return the mounted application.
    pub fn bootstrap(&mut self) -> BootResult<&Application> {
        if self.state() == BootState::Unstarted {
            self.install()?;
        }
        if self.state() == BootState::PluginsInstalled {
            self.construct()?;
        }
        self.mount()?;
        self.app
            .as_ref()
            .ok_or_else(|| BootError::missing("application", "root"))
    }

    /// Steps 1-3.
    pub fn install(&mut self) -> BootResult<()> {
        self.ensure_at(BootState::Unstarted, BootState::PluginsInstalled)?;
        let result = self.install_inner();
        self.finish_step(result)
    }

    /// Step 4.
    pub fn construct(&mut self) -> BootResult<&Application> {
        self.ensure_at(BootState::PluginsInstalled, BootState::Constructed)?;
        let result = self.construct_inner();
        self.finish_step(result)?;
        self.app
            .as_ref()
            .ok_or_else(|| BootError::missing("application", "root"))
    }

    /// Step 5. A second mount fails with `AlreadyMounted` and leaves the
    /// mounted application as it was.
    pub fn mount(&mut self) -> BootResult<()> {
        if self.state() == BootState::Mounted {
            let target = self
                .app
                .as_ref()
                .and_then(|a| a.mounted())
                .map(|m| m.target.to_string())
                .unwrap_or_else(|| self.manifest.target.to_string());
            return Err(BootError::AlreadyMounted { target });
        }
        self.ensure_at(BootState::Constructed, BootState::Mounted)?;
        let result = self.mount_inner();
        self.finish_step(result)
    }

    fn install_inner(&mut self) -> BootResult<()> {
        let options = self.manifest.options;
        self.runtime.configure(RuntimeConfig {
            verbose_diagnostics: options.verbose_diagnostics,
        });
        self.runtime
            .tip("Lectern is running in development mode; disable verboseDiagnostics for production");

        let version = self.manifest.version.version().to_string();
        self.runtime.inject_global(VERSION_GLOBAL, json!(version))?;
        log_registered(surfaces::GLOBALS, VERSION_GLOBAL);

        for extension in std::mem::take(&mut self.manifest.editor_extensions) {
            let name = extension.name().to_string();
            self.engine.attach_extension(extension)?;
            BootEventLogger::log(BootEvent::ExtensionAttached { name });
        }

        for component in std::mem::take(&mut self.manifest.components) {
            let name = component.name.clone();
            self.runtime.register_component(component)?;
            log_registered(surfaces::COMPONENTS, &name);
        }

        for (name, filter) in std::mem::take(&mut self.manifest.filters) {
            self.runtime.register_filter(&name, filter)?;
            log_registered(surfaces::FILTERS, &name);
        }

        for service in std::mem::take(&mut self.manifest.services) {
            let name = service.name().to_string();
            self.runtime.register_service(service)?;
            log_registered(surfaces::SERVICES, &name);
        }

        for plugin in std::mem::take(&mut self.manifest.plugins) {
            let name = plugin.name().to_string();
            self.runtime.use_plugin(plugin)?;
            BootEventLogger::log(BootEvent::PluginInstalled { name });
        }

        self.transition(BootState::PluginsInstalled)
    }

    fn construct_inner(&mut self) -> BootResult<()> {
        let declared = &self.manifest.app;
        let router = self
            .runtime
            .service(&declared.router, ServiceKind::Router)
            .ok_or_else(|| BootError::missing(ServiceKind::Router.to_string(), declared.router.clone()))?;
        let store = self
            .runtime
            .service(&declared.store, ServiceKind::Store)
            .ok_or_else(|| BootError::missing(ServiceKind::Store.to_string(), declared.store.clone()))?;

        let app = Application::new(
            declared.root.clone(),
            router,
            store,
            self.runtime.clone(),
            self.engine.clone(),
        );
        self.app = Some(app);
        self.transition(BootState::Constructed)
    }

    fn mount_inner(&mut self) -> BootResult<()> {
        let target = self.manifest.target.clone();
        let app = self
            .app
            .as_mut()
            .ok_or_else(|| BootError::missing("application", "root"))?;
        app.mount(target.clone())?;
        let app_id = app.id().to_string();

        self.runtime.seal();
        self.transition(BootState::Mounted)?;
        BootEventLogger::log(BootEvent::Mounted {
            app_id,
            target: target.to_string(),
        });
        Ok(())
    }

    fn transition(&mut self, next: BootState) -> BootResult<()> {
        let from = self.state.current();
        self.state.advance(next)?;
        BootEventLogger::log(BootEvent::StateChanged {
            from: from.to_string(),
            to: next.to_string(),
        });
        Ok(())
    }

    /// Refuse to run a step after a failure or out of order.
    fn ensure_at(&self, expected: BootState, next: BootState) -> BootResult<()> {
        if let Some(at) = self.failed_at {
            return Err(BootError::BootAborted { at });
        }
        let current = self.state.current();
        if current != expected {
            return Err(BootError::InvalidTransition { from: current, to: next });
        }
        Ok(())
    }

    fn finish_step(&mut self, result: BootResult<()>) -> BootResult<()> {
        if let Err(e) = &result {
            let at = self.state.current();
            self.failed_at = Some(at);
            error!(state = %at, error = %e, "Bootstrap aborted");
            BootEventLogger::log(BootEvent::Failed {
                at: at.to_string(),
                error: e.to_string(),
            });
        } else {
            info!(state = %self.state.current(), "Bootstrap step complete");
        }
        result
    }
}

fn log_registered(surface: &str, name: &str) {
    BootEventLogger::log(BootEvent::ModuleRegistered {
        surface: surface.to_string(),
        name: name.to_string(),
    });
}
