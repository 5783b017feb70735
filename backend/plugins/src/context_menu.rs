//! Context-menu plugin: renders a right-click menu on demand.
//!
//! Installing it contributes the `Contextmenu` component and the
//! `$contextmenu` global carrying the menu options views render with.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lectern_core::escape_html;

use crate::plugin::{InstallScope, Plugin};

/// Global key under which menu options are published.
pub const CONTEXT_MENU_GLOBAL: &str = "$contextmenu";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenuOptions {
    pub min_width: u32,
    pub z_index: u32,
}

impl Default for ContextMenuOptions {
    fn default() -> Self {
        Self {
            min_width: 150,
            z_index: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Draw a separator below this item.
    #[serde(default)]
    pub divided: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }
}

/// A context menu bound to a set of options.
#[derive(Debug, Clone, Default)]
pub struct ContextMenu {
    options: ContextMenuOptions,
}

impl ContextMenu {
    pub fn new(options: ContextMenuOptions) -> Self {
        Self { options }
    }

    /// Rebuild a menu from the published `$contextmenu` global.
    pub fn from_global(value: &Value) -> Result<Self> {
        let options: ContextMenuOptions =
            serde_json::from_value(value.clone()).context("parse $contextmenu options")?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ContextMenuOptions {
        &self.options
    }

    /// Render the menu at `(x, y)`.
    pub fn render(&self, items: &[MenuItem], x: i32, y: i32) -> String {
        format!(
            "<ul class=\"contextmenu\" style=\"left:{x}px;top:{y}px;min-width:{}px;z-index:{}\">{}</ul>",
            self.options.min_width,
            self.options.z_index,
            render_items(items)
        )
    }
}

fn render_items(items: &[MenuItem]) -> String {
    items
        .iter()
        .map(|item| {
            let mut class = String::from("contextmenu-item");
            if item.disabled {
                class.push_str(" disabled");
            }
            if item.divided {
                class.push_str(" divided");
            }
            let icon = item
                .icon
                .as_deref()
                .map(|i| format!("<i class=\"{}\"></i>", escape_html(i)))
                .unwrap_or_default();
            let children = if item.children.is_empty() {
                String::new()
            } else {
                format!("<ul class=\"contextmenu-submenu\">{}</ul>", render_items(&item.children))
            };
            format!("<li class=\"{class}\">{icon}{}{children}</li>", escape_html(&item.label))
        })
        .collect()
}

pub struct ContextMenuPlugin {
    options: ContextMenuOptions,
}

impl ContextMenuPlugin {
    pub const NAME: &'static str = "context-menu";

    pub fn new(options: ContextMenuOptions) -> Self {
        Self { options }
    }
}

impl Default for ContextMenuPlugin {
    fn default() -> Self {
        Self::new(ContextMenuOptions::default())
    }
}

impl Plugin for ContextMenuPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn install(&self, scope: &mut InstallScope) -> Result<()> {
        let options = serde_json::to_value(&self.options).context("serialize context menu options")?;
        scope
            .component("Contextmenu", "<div class=\"contextmenu-root\"></div>")
            .global(CONTEXT_MENU_GLOBAL, options);
        Ok(())
    }
}
