//! The framework plugin contract.
//!
//! A plugin is anything with a name and an `install` hook. The hook never
//! touches the runtime directly: it stages its contributions in an
//! [`InstallScope`], and the runtime commits them only when all are free.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::services::Service;

/// A filter transforms a display string (e.g. date formatting in templates).
pub type FilterFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A globally registered view component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    /// Plugin or module that registered it.
    pub provided_by: String,
    /// Markup emitted where the component is used.
    pub template: String,
}

/// A framework-level plugin installed into the [`Runtime`](crate::Runtime).
pub trait Plugin: Send + Sync {
    /// Unique plugin name; installing two plugins with the same name fails.
    fn name(&self) -> &str;

    /// Stage this plugin's contributions. Returning `Err` aborts the install
    /// and leaves the runtime unchanged.
    fn install(&self, scope: &mut InstallScope) -> Result<()>;
}

/// Staging area for one plugin's contributions.
pub struct InstallScope {
    owner: String,
    pub(crate) services: Vec<(String, Arc<dyn Service>)>,
    pub(crate) components: Vec<(String, Component)>,
    pub(crate) filters: Vec<(String, FilterFn)>,
    pub(crate) globals: Vec<(String, Value)>,
}

impl InstallScope {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            services: Vec::new(),
            components: Vec::new(),
            filters: Vec::new(),
            globals: Vec::new(),
        }
    }

    /// Name of the plugin being installed.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn provide_service(&mut self, service: Arc<dyn Service>) -> &mut Self {
        self.services.push((service.name().to_string(), service));
        self
    }

    pub fn component(&mut self, name: impl Into<String>, template: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.components.push((
            name.clone(),
            Component {
                name,
                provided_by: self.owner.clone(),
                template: template.into(),
            },
        ));
        self
    }

    pub fn filter(&mut self, name: impl Into<String>, filter: FilterFn) -> &mut Self {
        self.filters.push((name.into(), filter));
        self
    }

    pub fn global(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.globals.push((key.into(), value));
        self
    }

    /// Number of staged contributions.
    pub fn len(&self) -> usize {
        self.services.len() + self.components.len() + self.filters.len() + self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
