use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use lectern_core::escape_html;

use crate::error::EditorError;
use crate::extension::{ElementNode, ElementRenderer, MenuDef};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub read_only: bool,
    /// Menu keys hidden from the toolbar.
    #[serde(default)]
    pub exclude_menu_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Paragraph(String),
    Element(ElementNode),
}

/// One editor instance, bound to the engine's menus and elements as they
/// were when the engine activated.
pub struct Editor {
    config: EditorConfig,
    menus: Vec<(String, MenuDef)>,
    elements: HashMap<String, Arc<dyn ElementRenderer>>,
    document: Vec<Node>,
}

impl Editor {
    pub(crate) fn new(
        config: EditorConfig,
        menus: Vec<(String, MenuDef)>,
        elements: Vec<(String, Arc<dyn ElementRenderer>)>,
    ) -> Self {
        Self {
            config,
            menus,
            elements: elements.into_iter().collect(),
            document: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Toolbar menu keys in registration order, minus excluded keys.
    pub fn menu_keys(&self) -> Vec<String> {
        self.menus
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !self.config.exclude_menu_keys.contains(*key))
            .cloned()
            .collect()
    }

    pub fn menu(&self, key: &str) -> Option<&MenuDef> {
        self.menus.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    pub fn menu_config(&self, key: &str) -> Option<&Value> {
        self.menu(key).map(|m| &m.config)
    }

    pub fn supports_element(&self, kind: &str) -> bool {
        self.elements.contains_key(kind)
    }

    pub fn insert_text(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_writable()?;
        self.document.push(Node::Paragraph(text.into()));
        Ok(())
    }

    pub fn insert_element(
        &mut self,
        kind: &str,
        attrs: BTreeMap<String, String>,
    ) -> Result<(), EditorError> {
        self.ensure_writable()?;
        if !self.supports_element(kind) {
            return Err(EditorError::UnknownElement(kind.to_string()));
        }
        debug!(kind = %kind, "Inserting element");
        self.document.push(Node::Element(ElementNode {
            kind: kind.to_string(),
            attrs,
        }));
        Ok(())
    }

    pub fn document(&self) -> &[Node] {
        &self.document
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Serialize the document. Inline elements are wrapped in a paragraph.
    pub fn to_html(&self) -> String {
        if self.document.is_empty() && !self.config.placeholder.is_empty() {
            return format!(
                "<p data-placeholder=\"{}\"></p>",
                escape_html(&self.config.placeholder)
            );
        }
        self.document
            .iter()
            .map(|node| match node {
                Node::Paragraph(text) => format!("<p>{}</p>", escape_html(text)),
                Node::Element(elem) => match self.elements.get(&elem.kind) {
                    Some(renderer) if renderer.is_inline() => {
                        format!("<p>{}</p>", renderer.to_html(elem))
                    }
                    Some(renderer) => renderer.to_html(elem),
                    None => String::new(),
                },
            })
            .collect()
    }

    fn ensure_writable(&self) -> Result<(), EditorError> {
        if self.config.read_only {
            return Err(EditorError::ReadOnly);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("config", &self.config)
            .field("menus", &self.menu_keys())
            .field("nodes", &self.document.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Divider;

    impl ElementRenderer for Divider {
        fn to_html(&self, _element: &ElementNode) -> String {
            "<hr/>".into()
        }
    }

    fn editor(config: EditorConfig) -> Editor {
        let menu = MenuDef {
            key: "divider".into(),
            title: "Divider".into(),
            icon: None,
            provided_by: "basic".into(),
            config: json!({}),
        };
        Editor::new(
            config,
            vec![("divider".into(), menu)],
            vec![("divider".into(), Arc::new(Divider) as Arc<dyn ElementRenderer>)],
        )
    }

    #[test]
    fn test_text_and_block_element() {
        let mut ed = editor(EditorConfig::default());
        ed.insert_text("a < b").unwrap();
        ed.insert_element("divider", BTreeMap::new()).unwrap();
        assert_eq!(ed.to_html(), "<p>a &lt; b</p><hr/>");
    }

    #[test]
    fn test_unknown_element() {
        let mut ed = editor(EditorConfig::default());
        let err = ed.insert_element("video", BTreeMap::new()).unwrap_err();
        assert_eq!(err, EditorError::UnknownElement("video".into()));
        assert!(ed.is_empty());
    }

    #[test]
    fn test_read_only() {
        let mut ed = editor(EditorConfig {
            read_only: true,
            ..Default::default()
        });
        assert_eq!(ed.insert_text("x"), Err(EditorError::ReadOnly));
    }

    #[test]
    fn test_placeholder_and_excluded_menus() {
        let ed = editor(EditorConfig {
            placeholder: "Type here...".into(),
            exclude_menu_keys: vec!["divider".into()],
            ..Default::default()
        });
        assert_eq!(ed.to_html(), "<p data-placeholder=\"Type here...\"></p>");
        assert!(ed.menu_keys().is_empty());
        assert!(ed.menu("divider").is_some());
    }
}
