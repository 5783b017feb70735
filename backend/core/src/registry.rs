//! Capability registry: a named, append-only registration surface.
//!
//! One registry exists per surface (framework plugins, services, global
//! components, editor extensions, ...). Entries are added exactly once, never
//! removed or overwritten, and the whole surface becomes read-only once sealed.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{BootError, BootResult};

struct Entries<T> {
    by_name: HashMap<String, T>,
    /// Registration order, for listing.
    order: Vec<String>,
    sealed: bool,
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            order: Vec::new(),
            sealed: false,
        }
    }
}

/// Thread-safe registry of named capabilities for a single surface.
///
/// Clones share the same underlying entries.
#[derive(Clone)]
pub struct CapabilityRegistry<T> {
    surface: Arc<str>,
    entries: Arc<RwLock<Entries<T>>>,
}

impl<T: Clone> CapabilityRegistry<T> {
    pub fn new(surface: impl Into<String>) -> Self {
        let surface: String = surface.into();
        Self {
            surface: Arc::from(surface),
            entries: Arc::new(RwLock::new(Entries::default())),
        }
    }

    /// Name of the surface this registry serves, used in errors and logs.
    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Register `value` under `name`.
    ///
    /// The duplicate check and the insert happen under one write lock, so
    /// racing callers can never both succeed for the same name. On error the
    /// registry is left untouched.
    pub fn register(&self, name: impl Into<String>, value: T) -> BootResult<()> {
        let name = name.into();
        self.check_name(&name)?;

        let mut entries = self.write();
        self.check_insert(&entries, &name)?;
        entries.order.push(name.clone());
        entries.by_name.insert(name.clone(), value);
        debug!(surface = %self.surface, module = %name, "Registered");
        Ok(())
    }

    /// Register several entries atomically: either all land or none do.
    pub fn register_all(&self, items: Vec<(String, T)>) -> BootResult<()> {
        for (name, _) in &items {
            self.check_name(name)?;
        }

        let mut entries = self.write();
        for (i, (name, _)) in items.iter().enumerate() {
            self.check_insert(&entries, name)?;
            if items[..i].iter().any(|(earlier, _)| earlier == name) {
                return Err(BootError::duplicate(self.surface.as_ref(), name.clone()));
            }
        }
        for (name, value) in items {
            debug!(surface = %self.surface, module = %name, "Registered");
            entries.order.push(name.clone());
            entries.by_name.insert(name, value);
        }
        Ok(())
    }

    /// Fail if `name` cannot currently be registered, without registering it.
    pub fn ensure_available(&self, name: &str) -> BootResult<()> {
        self.check_name(name)?;
        self.check_insert(&self.read(), name)
    }

    /// Fail if any of `names` cannot currently be registered, including a
    /// name repeated within `names` itself.
    pub fn ensure_all_available<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> BootResult<()> {
        let entries = self.read();
        let mut seen: Vec<&str> = Vec::new();
        for name in names {
            self.check_name(name)?;
            self.check_insert(&entries, name)?;
            if seen.contains(&name) {
                return Err(BootError::duplicate(self.surface.as_ref(), name));
            }
            seen.push(name);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<T> {
        self.read().by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.read().order.clone()
    }

    /// Registered entries in registration order.
    pub fn entries(&self) -> Vec<(String, T)> {
        let entries = self.read();
        entries
            .order
            .iter()
            .filter_map(|name| entries.by_name.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    /// Make the registry read-only. Sealing twice is a no-op.
    pub fn seal(&self) {
        let mut entries = self.write();
        if !entries.sealed {
            entries.sealed = true;
            debug!(surface = %self.surface, count = entries.order.len(), "Sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.read().sealed
    }

    fn check_name(&self, name: &str) -> BootResult<()> {
        if name.trim().is_empty() {
            return Err(BootError::InvalidModuleName {
                surface: self.surface.to_string(),
                reason: "name cannot be empty".into(),
            });
        }
        Ok(())
    }

    fn check_insert(&self, entries: &Entries<T>, name: &str) -> BootResult<()> {
        if entries.sealed {
            return Err(BootError::RegistrySealed {
                surface: self.surface.to_string(),
                name: name.to_string(),
            });
        }
        if entries.by_name.contains_key(name) {
            return Err(BootError::duplicate(self.surface.as_ref(), name));
        }
        Ok(())
    }

    // A panic while holding the lock cannot leave a half-inserted entry
    // (insert is the last step), so poisoned guards are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Entries<T>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries<T>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> std::fmt::Debug for CapabilityRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("CapabilityRegistry")
            .field("surface", &self.surface)
            .field("names", &entries.order)
            .field("sealed", &entries.sealed)
            .finish()
    }
}
