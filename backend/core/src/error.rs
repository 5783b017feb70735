use thiserror::Error;

use crate::state::BootState;

/// Top-level error type for the Lectern bootstrap protocol.
///
/// Every variant is fatal to startup: the composition root never retries and
/// never swallows one of these.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("duplicate registration of '{name}' in {surface}")]
    DuplicateRegistration { surface: String, name: String },

    #[error("plugin already installed: {0}")]
    PluginAlreadyInstalled(String),

    #[error("editor engine already active; cannot attach extension '{extension}'")]
    EngineAlreadyActive { extension: String },

    #[error("missing {role} dependency: '{name}' was never registered")]
    MissingDependency { role: String, name: String },

    #[error("application already mounted at '{target}'")]
    AlreadyMounted { target: String },

    #[error("{surface} is sealed; cannot register '{name}'")]
    RegistrySealed { surface: String, name: String },

    #[error("invalid module name in {surface}: {reason}")]
    InvalidModuleName { surface: String, reason: String },

    #[error("invalid boot transition: {from} -> {to}")]
    InvalidTransition { from: BootState, to: BootState },

    #[error("bootstrap already failed at {at}; start a new process")]
    BootAborted { at: BootState },

    #[error("invalid version '{0}': expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BootError {
    pub fn duplicate(surface: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            surface: surface.into(),
            name: name.into(),
        }
    }

    pub fn missing(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingDependency {
            role: role.into(),
            name: name.into(),
        }
    }
}

pub type BootResult<T> = std::result::Result<T, BootError>;
