//! The application instance: router + store + root view, mounted once.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use lectern_core::{escape_html, BootError, BootResult};
use lectern_editor::{EditorConfig, EditorEngine};
use lectern_plugins::{Router, Runtime, Service, Store};

/// Global key under which version metadata is injected.
pub const VERSION_GLOBAL: &str = "VERSION";

/// Opaque handle to a host-provided mount point, e.g. `#app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountTarget(String);

impl MountTarget {
    pub fn parse(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        if selector.is_empty() || selector == "#" {
            bail!("mount target cannot be empty");
        }
        Ok(Self(selector.to_string()))
    }

    pub fn selector(&self) -> &str {
        &self.0
    }

    /// The element id for `#id` selectors, otherwise the selector itself.
    pub fn element_id(&self) -> &str {
        self.0.strip_prefix('#').unwrap_or(&self.0)
    }
}

impl std::fmt::Display for MountTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a root view can see while rendering.
pub struct RenderContext<'a> {
    runtime: &'a Runtime,
    engine: &'a EditorEngine,
    router: &'a dyn Service,
    store: &'a dyn Service,
}

impl<'a> RenderContext<'a> {
    pub fn runtime(&self) -> &Runtime {
        self.runtime
    }

    pub fn engine(&self) -> &EditorEngine {
        self.engine
    }

    pub fn router(&self) -> Option<&Router> {
        self.router.as_any().downcast_ref::<Router>()
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_any().downcast_ref::<Store>()
    }

    pub fn global(&self, key: &str) -> Option<Value> {
        self.runtime.global(key)
    }

    pub fn version(&self) -> Option<String> {
        self.global(VERSION_GLOBAL)
            .and_then(|v| v.as_str().map(str::to_string))
    }
}

/// The top-level view of the application.
pub trait RootView: Send + Sync {
    fn name(&self) -> &str;

    fn render(&self, ctx: &RenderContext<'_>) -> Result<String>;
}

/// The default `App` view: current route, editor toolbar and document, and
/// the context-menu root when that plugin is installed.
pub struct AppView {
    start_path: String,
    editor: EditorConfig,
}

impl AppView {
    pub fn new(start_path: impl Into<String>, editor: EditorConfig) -> Self {
        Self {
            start_path: start_path.into(),
            editor,
        }
    }
}

impl Default for AppView {
    fn default() -> Self {
        Self::new("/", EditorConfig::default())
    }
}

impl RootView for AppView {
    fn name(&self) -> &str {
        "App"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<String> {
        let runtime = ctx.runtime();
        let version = escape_html(&ctx.version().unwrap_or_default());

        let route = ctx
            .router()
            .and_then(|r| r.resolve(&self.start_path))
            .map(|r| escape_html(&r.view))
            .unwrap_or_default();
        let router_view = runtime
            .component("router-view")
            .map(|c| c.template)
            .unwrap_or_default();

        // First real use of the editor engine; its extension set is final from here.
        let editor = ctx.engine().create_editor(self.editor.clone());
        let toolbar: String = editor
            .menu_keys()
            .iter()
            .filter_map(|key| editor.menu(key))
            .map(|menu| {
                format!(
                    "<button data-menu=\"{}\">{}</button>",
                    escape_html(&menu.key),
                    escape_html(&menu.title)
                )
            })
            .collect();

        let context_menu = runtime
            .component("Contextmenu")
            .map(|c| c.template)
            .unwrap_or_default();

        runtime.tip(&format!("Rendering {} at route '{}'", self.name(), self.start_path));

        Ok(format!(
            "<div class=\"app\" data-version=\"{version}\" data-route=\"{route}\">{router_view}\
             <div class=\"editor-toolbar\">{toolbar}</div>\
             <div class=\"editor\">{}</div>{context_menu}</div>",
            editor.to_html()
        ))
    }
}

/// Record of the single successful mount.
#[derive(Debug, Clone, PartialEq)]
pub struct MountedView {
    pub target: MountTarget,
    pub markup: String,
    pub mounted_at: DateTime<Utc>,
}

pub struct Application {
    id: Uuid,
    root: Arc<dyn RootView>,
    router: Arc<dyn Service>,
    store: Arc<dyn Service>,
    runtime: Arc<Runtime>,
    engine: Arc<EditorEngine>,
    mounted: Option<MountedView>,
}

impl Application {
    pub fn new(
        root: Arc<dyn RootView>,
        router: Arc<dyn Service>,
        store: Arc<dyn Service>,
        runtime: Arc<Runtime>,
        engine: Arc<EditorEngine>,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(app_id = %id, root = %root.name(), router = %router.name(), store = %store.name(), "Application constructed");
        Self {
            id,
            root,
            router,
            store,
            runtime,
            engine,
            mounted: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn router_name(&self) -> &str {
        self.router.name()
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn mounted(&self) -> Option<&MountedView> {
        self.mounted.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Render the root view and attach it to `target`. Only the first call
    /// can succeed; later calls fail without touching the mounted view.
    pub fn mount(&mut self, target: MountTarget) -> BootResult<&MountedView> {
        if let Some(existing) = &self.mounted {
            return Err(BootError::AlreadyMounted {
                target: existing.target.to_string(),
            });
        }

        let ctx = RenderContext {
            runtime: &self.runtime,
            engine: &self.engine,
            router: self.router.as_ref(),
            store: self.store.as_ref(),
        };
        let markup = self
            .root
            .render(&ctx)
            .with_context(|| format!("Root view '{}' failed to render", self.root.name()))?;

        info!(app_id = %self.id, target = %target, bytes = markup.len(), "Application mounted");
        Ok(&*self.mounted.insert(MountedView {
            target,
            markup,
            mounted_at: Utc::now(),
        }))
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("root", &self.root.name())
            .field("router", &self.router.name())
            .field("store", &self.store.name())
            .field("mounted", &self.mounted.as_ref().map(|m| m.target.selector()))
            .finish()
    }
}
