//! Lectern bootstrap.
//!
//! A [`BootManifest`] declares everything the app needs; a
//! [`CompositionRoot`] registers it in a fixed order, constructs the
//! [`Application`] and mounts it exactly once.

pub mod application;
pub mod manifest;
pub mod root;

pub use application::{
    AppView, Application, MountTarget, MountedView, RenderContext, RootView, VERSION_GLOBAL,
};
pub use manifest::{AppSpec, BootManifest, BootOptions};
pub use root::CompositionRoot;
