use thiserror::Error;

/// Errors raised while editing a document (as opposed to bootstrap errors).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("unknown element kind: {0}")]
    UnknownElement(String),

    #[error("editor is read-only")]
    ReadOnly,

    #[error("menu '{0}' is not registered or has no configuration")]
    MissingMenuConfig(String),

    #[error("invalid configuration for menu '{menu}': {reason}")]
    InvalidMenuConfig { menu: String, reason: String },

    #[error("file '{name}' is {size} bytes; limit is {max}")]
    FileTooLarge { name: String, size: u64, max: u64 },

    #[error("file '{name}' has disallowed type '{mime_type}'")]
    FileTypeNotAllowed { name: String, mime_type: String },
}
