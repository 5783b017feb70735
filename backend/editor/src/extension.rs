//! Editor extension contract.
//!
//! Extensions attach to the engine, not to the UI runtime. Like framework
//! plugins they stage everything in a scope and the engine commits the lot.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A toolbar/menu command contributed by an extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuDef {
    pub key: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Extension that contributed this menu.
    pub provided_by: String,
    /// Menu-specific configuration (e.g. upload limits).
    pub config: Value,
}

/// An element node in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    pub kind: String,
    pub attrs: BTreeMap<String, String>,
}

impl ElementNode {
    pub fn attr(&self, name: &str) -> &str {
        self.attrs.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Converts one element kind to HTML.
pub trait ElementRenderer: Send + Sync {
    fn to_html(&self, element: &ElementNode) -> String;

    fn is_inline(&self) -> bool {
        false
    }
}

/// A module that extends the editor engine.
pub trait EditorExtension: Send + Sync {
    fn name(&self) -> &str;

    fn install(&self, scope: &mut ExtensionScope) -> Result<()>;
}

/// Staging area for one extension's contributions.
pub struct ExtensionScope {
    owner: String,
    pub(crate) menus: Vec<(String, MenuDef)>,
    pub(crate) elements: Vec<(String, Arc<dyn ElementRenderer>)>,
}

impl ExtensionScope {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            menus: Vec::new(),
            elements: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn menu(
        &mut self,
        key: impl Into<String>,
        title: impl Into<String>,
        icon: Option<String>,
        config: Value,
    ) -> &mut Self {
        let key = key.into();
        self.menus.push((
            key.clone(),
            MenuDef {
                key,
                title: title.into(),
                icon,
                provided_by: self.owner.clone(),
                config,
            },
        ));
        self
    }

    pub fn element(&mut self, kind: impl Into<String>, renderer: Arc<dyn ElementRenderer>) -> &mut Self {
        self.elements.push((kind.into(), renderer));
        self
    }
}
