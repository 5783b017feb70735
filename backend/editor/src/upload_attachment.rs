//! Attachment-upload extension.
//!
//! Adds the `uploadAttachment` toolbar menu and the inline, void
//! `attachment` element. The transfer itself belongs to the host; this module
//! only validates candidate files against the configured limits and renders
//! uploaded attachments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use lectern_core::escape_html;

use crate::editor::Editor;
use crate::error::EditorError;
use crate::extension::{EditorExtension, ElementNode, ElementRenderer, ExtensionScope};

pub const EXTENSION_NAME: &str = "upload-attachment";
pub const MENU_KEY: &str = "uploadAttachment";
pub const ELEMENT_KIND: &str = "attachment";

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default upload timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAttachmentConfig {
    /// Upload endpoint.
    #[serde(default)]
    pub server: String,
    #[serde(default = "default_field_name")]
    pub field_name: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// MIME types accepted; `type/*` wildcards allowed; empty accepts all.
    #[serde(default)]
    pub allowed_file_types: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_field_name() -> String {
    "file".to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for UploadAttachmentConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            field_name: default_field_name(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_file_types: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// A file the user picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl UploadAttachmentConfig {
    /// Reject files over the size limit or of a disallowed type.
    pub fn check(&self, file: &AttachmentFile) -> Result<(), EditorError> {
        if file.size > self.max_file_size {
            return Err(EditorError::FileTooLarge {
                name: file.name.clone(),
                size: file.size,
                max: self.max_file_size,
            });
        }
        if !self.allowed_file_types.is_empty()
            && !self
                .allowed_file_types
                .iter()
                .any(|allowed| mime_matches(allowed, &file.mime_type))
        {
            return Err(EditorError::FileTypeNotAllowed {
                name: file.name.clone(),
                mime_type: file.mime_type.clone(),
            });
        }
        Ok(())
    }
}

fn mime_matches(pattern: &str, mime_type: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(prefix) => mime_type
            .split_once('/')
            .map(|(top, _)| top.eq_ignore_ascii_case(prefix))
            .unwrap_or(false),
        None => pattern.eq_ignore_ascii_case(mime_type),
    }
}

/// Renders `attachment` elements as download links.
struct AttachmentRenderer;

impl ElementRenderer for AttachmentRenderer {
    fn to_html(&self, element: &ElementNode) -> String {
        let file_name = escape_html(element.attr("fileName"));
        let link = escape_html(element.attr("link"));
        format!(
            "<a data-w-e-type=\"attachment\" data-w-e-is-void data-w-e-is-inline href=\"{link}\" download=\"{file_name}\">{file_name}</a>"
        )
    }

    fn is_inline(&self) -> bool {
        true
    }
}

pub struct UploadAttachmentExtension {
    config: UploadAttachmentConfig,
}

impl UploadAttachmentExtension {
    pub fn new(config: UploadAttachmentConfig) -> Self {
        Self { config }
    }
}

impl EditorExtension for UploadAttachmentExtension {
    fn name(&self) -> &str {
        EXTENSION_NAME
    }

    fn install(&self, scope: &mut ExtensionScope) -> Result<()> {
        let config = serde_json::to_value(&self.config).context("serialize upload config")?;
        scope
            .menu(MENU_KEY, "Upload attachment", Some("icon-attachment".into()), config)
            .element(ELEMENT_KIND, Arc::new(AttachmentRenderer));
        Ok(())
    }
}

/// Upload config of `editor`'s attachment menu.
pub fn upload_config(editor: &Editor) -> Result<UploadAttachmentConfig, EditorError> {
    let value = editor
        .menu_config(MENU_KEY)
        .ok_or_else(|| EditorError::MissingMenuConfig(MENU_KEY.to_string()))?;
    serde_json::from_value(value.clone()).map_err(|e| EditorError::InvalidMenuConfig {
        menu: MENU_KEY.to_string(),
        reason: e.to_string(),
    })
}

/// Validate `file` against the editor's upload config and, once the host has
/// stored it at `link`, insert it as an attachment element.
pub fn insert_attachment(
    editor: &mut Editor,
    file: &AttachmentFile,
    link: &str,
) -> Result<(), EditorError> {
    upload_config(editor)?.check(file)?;
    let mut attrs = BTreeMap::new();
    attrs.insert("fileName".to_string(), file.name.clone());
    attrs.insert("link".to_string(), link.to_string());
    editor.insert_element(ELEMENT_KIND, attrs)
}
