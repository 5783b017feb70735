pub mod context_menu;
pub mod plugin;
pub mod runtime;
pub mod services;

pub use context_menu::{ContextMenu, ContextMenuOptions, ContextMenuPlugin, MenuItem, CONTEXT_MENU_GLOBAL};
pub use plugin::{Component, FilterFn, InstallScope, Plugin};
pub use runtime::{surfaces, Runtime, RuntimeConfig};
pub use services::{Route, Router, RouterPlugin, Service, ServiceKind, Store};
