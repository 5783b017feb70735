//! `lectern-editor`: the document-editing engine and its extension modules.
//!
//! Extensions attach through the same at-most-once registry discipline as
//! framework plugins, but into the engine's own registries. Attachment must
//! finish before any view creates an editor.

pub mod editor;
pub mod engine;
pub mod error;
pub mod extension;
pub mod upload_attachment;

pub use editor::{Editor, EditorConfig, Node};
pub use engine::{attach_extension, EditorEngine, EngineState};
pub use error::EditorError;
pub use extension::{EditorExtension, ElementNode, ElementRenderer, ExtensionScope, MenuDef};
pub use upload_attachment::{
    insert_attachment, upload_config, AttachmentFile, UploadAttachmentConfig, UploadAttachmentExtension,
};
