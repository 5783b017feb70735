//! Application services the root instance depends on: a router and a store.
//!
//! Both are thin collaborators; route guards and store mutations live with
//! their owners, not here.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::plugin::{InstallScope, Plugin};

/// Role a service plays for the application instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Router,
    Store,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Router => write!(f, "router"),
            ServiceKind::Store => write!(f, "store"),
        }
    }
}

/// A named service registered into the runtime's service registry.
pub trait Service: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> ServiceKind;
    fn as_any(&self) -> &dyn Any;
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub view: String,
}

#[derive(Debug, Clone)]
pub struct Router {
    name: String,
    routes: Vec<Route>,
}

impl Router {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
        }
    }

    pub fn with_route(mut self, path: impl Into<String>, view: impl Into<String>) -> Self {
        self.routes.push(Route {
            path: path.into(),
            view: view.into(),
        });
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Exact-match lookup; the first matching route wins.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.path == path)
    }
}

impl Service for Router {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Router
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Installs a router: registers it as a service and contributes the
/// `router-view` / `router-link` components.
pub struct RouterPlugin {
    router: Arc<Router>,
}

impl RouterPlugin {
    pub const NAME: &'static str = "router";

    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

impl Plugin for RouterPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn install(&self, scope: &mut InstallScope) -> Result<()> {
        debug!(router = %self.router.name(), routes = self.router.routes.len(), "Installing router");
        scope
            .provide_service(self.router.clone())
            .component("router-view", "<router-view></router-view>")
            .component("router-link", "<a class=\"router-link\"></a>");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Key/value application state.
#[derive(Debug)]
pub struct Store {
    name: String,
    state: RwLock<BTreeMap<String, Value>>,
}

impl Store {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_state(self, key: impl Into<String>, value: Value) -> Self {
        self.commit(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    pub fn commit(&self, key: impl Into<String>, value: Value) {
        self.state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value);
    }

    /// Serializable copy of the whole state.
    pub fn snapshot(&self) -> Value {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Value::Object(state.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl Service for Store {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Store
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_router_resolve() {
        let router = Router::new("R1")
            .with_route("/", "Home")
            .with_route("/docs", "Documents");
        assert_eq!(router.resolve("/docs").unwrap().view, "Documents");
        assert!(router.resolve("/missing").is_none());
        assert_eq!(router.kind(), ServiceKind::Router);
    }

    #[test]
    fn test_router_plugin_stages_service_and_components() {
        let plugin = RouterPlugin::new(Arc::new(Router::new("R1")));
        let mut scope = InstallScope::new(plugin.name());
        plugin.install(&mut scope).unwrap();
        assert_eq!(scope.services.len(), 1);
        assert_eq!(scope.services[0].0, "R1");
        assert_eq!(scope.components.len(), 2);
        assert!(scope.components.iter().all(|(_, c)| c.provided_by == "router"));
    }

    #[test]
    fn test_store_commit_and_snapshot() {
        let store = Store::new("S1").with_state("user", json!("ada"));
        store.commit("count", json!(2));
        assert_eq!(store.get("count"), Some(json!(2)));
        assert_eq!(store.snapshot(), json!({"count": 2, "user": "ada"}));
    }

    #[test]
    fn test_downcast_through_service() {
        let svc: Arc<dyn Service> = Arc::new(Store::new("S1"));
        assert!(svc.as_any().downcast_ref::<Store>().is_some());
        assert!(svc.as_any().downcast_ref::<Router>().is_none());
    }
}
