//! The process-wide module registry.
//!
//! Plugin crates self-register a [`ModuleDef`] into a link-time table via
//! [`crate::register_module!`]; the registry is built from that table once
//! at startup and injected into finders as `Arc<dyn ModuleRegistry>`. No
//! ambient global state is read during discovery.
//!
//! Eager definitions count as already loaded the moment the registry is
//! built; lazy ones become loaded when something asks for them by name.
//! Activation is idempotent and append-only, so enumeration order is stable
//! within a process lifetime.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::manifest::Manifest;

/// A statically registered module definition. Never mutated; lives for the
/// process lifetime.
#[derive(Clone, Copy)]
pub struct ModuleDef {
    name: &'static str,
    eager: bool,
    manifest: fn() -> Manifest,
}

impl ModuleDef {
    #[must_use]
    pub const fn new(name: &'static str, eager: bool, manifest: fn() -> Manifest) -> Self {
        Self {
            name,
            eager,
            manifest,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn is_eager(&self) -> bool {
        self.eager
    }
}

inventory::collect!(ModuleDef);

/// Cheap handle to a loaded module.
#[derive(Clone, Copy)]
pub struct ModuleHandle {
    name: &'static str,
    manifest: fn() -> Manifest,
}

impl ModuleHandle {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Enumerates the module's exported types.
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        (self.manifest)()
    }
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The requested name is not linked into this binary.
    #[error("unknown module '{module}'")]
    UnknownModule { module: String },

    /// Two definitions share a name; a registry refusing to guess which one
    /// wins is a construction-time failure.
    #[error("duplicate module definition '{module}'")]
    DuplicateModule { module: String },
}

/// Queryable set of loaded modules. Append-only from the caller's point of
/// view: loading is the only mutation, and it never removes anything.
pub trait ModuleRegistry: Send + Sync {
    /// Currently loaded modules in activation order.
    fn list_loaded(&self) -> Vec<ModuleHandle>;

    /// Activates a known module by name, idempotently.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] if no definition with this
    /// name exists.
    fn load(&self, name: &str) -> Result<ModuleHandle, RegistryError>;
}

/// Registry backed by the link-time definition table.
pub struct StaticModuleRegistry {
    defs: HashMap<&'static str, ModuleDef>,
    loaded: RwLock<Vec<ModuleHandle>>,
}

impl std::fmt::Debug for StaticModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticModuleRegistry").finish_non_exhaustive()
    }
}

impl StaticModuleRegistry {
    /// Builds the registry from every definition linked into the binary.
    ///
    /// Eager definitions are pre-loaded. The link-time table has no defined
    /// order, so eager modules are enumerated sorted by name to keep scans
    /// deterministic across builds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateModule`] if two definitions share
    /// a name.
    pub fn from_inventory() -> Result<Self, RegistryError> {
        Self::with_definitions(inventory::iter::<ModuleDef>.into_iter().copied().collect())
    }

    /// Builds a registry from an explicit definition list. Intended for
    /// tests and embedders that assemble their own table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateModule`] if two definitions share
    /// a name.
    pub fn with_definitions(mut definitions: Vec<ModuleDef>) -> Result<Self, RegistryError> {
        definitions.sort_by_key(ModuleDef::name);

        let mut defs = HashMap::with_capacity(definitions.len());
        let mut loaded = Vec::new();
        for def in definitions {
            if defs.insert(def.name, def).is_some() {
                return Err(RegistryError::DuplicateModule {
                    module: def.name.to_owned(),
                });
            }
            if def.eager {
                loaded.push(handle_of(&def));
            }
        }

        tracing::debug!(
            total = defs.len(),
            eager = loaded.len(),
            "module registry built"
        );

        Ok(Self {
            defs,
            loaded: RwLock::new(loaded),
        })
    }

    /// Number of known definitions, loaded or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

fn handle_of(def: &ModuleDef) -> ModuleHandle {
    ModuleHandle {
        name: def.name,
        manifest: def.manifest,
    }
}

impl ModuleRegistry for StaticModuleRegistry {
    fn list_loaded(&self) -> Vec<ModuleHandle> {
        self.loaded.read().clone()
    }

    fn load(&self, name: &str) -> Result<ModuleHandle, RegistryError> {
        let def = self
            .defs
            .get(name)
            .ok_or_else(|| RegistryError::UnknownModule {
                module: name.to_owned(),
            })?;

        let mut loaded = self.loaded.write();
        if let Some(existing) = loaded.iter().find(|h| h.name == def.name) {
            return Ok(*existing);
        }
        let handle = handle_of(def);
        loaded.push(handle);
        tracing::debug!(module = name, "module activated");
        Ok(handle)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn empty_manifest() -> Manifest {
        Manifest::Ready(Vec::new())
    }

    #[test]
    fn eager_definitions_are_preloaded_sorted_by_name() {
        let registry = StaticModuleRegistry::with_definitions(vec![
            ModuleDef::new("zeta", true, empty_manifest),
            ModuleDef::new("alpha", true, empty_manifest),
            ModuleDef::new("lazy_one", false, empty_manifest),
        ])
        .unwrap();

        let names: Vec<_> = registry.list_loaded().iter().map(ModuleHandle::name).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn load_activates_lazy_definition_in_append_order() {
        let registry = StaticModuleRegistry::with_definitions(vec![
            ModuleDef::new("alpha", true, empty_manifest),
            ModuleDef::new("lazy_one", false, empty_manifest),
        ])
        .unwrap();

        registry.load("lazy_one").unwrap();
        let names: Vec<_> = registry.list_loaded().iter().map(ModuleHandle::name).collect();
        assert_eq!(names, ["alpha", "lazy_one"]);
    }

    #[test]
    fn load_is_idempotent() {
        let registry = StaticModuleRegistry::with_definitions(vec![ModuleDef::new(
            "alpha",
            false,
            empty_manifest,
        )])
        .unwrap();

        registry.load("alpha").unwrap();
        registry.load("alpha").unwrap();
        assert_eq!(registry.list_loaded().len(), 1);
    }

    #[test]
    fn load_of_already_eager_module_is_a_no_op() {
        let registry = StaticModuleRegistry::with_definitions(vec![ModuleDef::new(
            "alpha",
            true,
            empty_manifest,
        )])
        .unwrap();

        registry.load("alpha").unwrap();
        assert_eq!(registry.list_loaded().len(), 1);
    }

    #[test]
    fn unknown_name_fails() {
        let registry = StaticModuleRegistry::with_definitions(Vec::new()).unwrap();
        let err = registry.load("ghost").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownModule { module } if module == "ghost"));
    }

    #[test]
    fn duplicate_names_fail_at_construction() {
        let err = StaticModuleRegistry::with_definitions(vec![
            ModuleDef::new("dup", true, empty_manifest),
            ModuleDef::new("dup", false, empty_manifest),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateModule { module } if module == "dup"));
    }
}
