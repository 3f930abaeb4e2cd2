//! The type-discovery engine.
//!
//! A finder enumerates candidate modules (registry enumeration filtered by
//! name patterns, plus force-loaded extras), then scans every exported type
//! for a target capability. Unenumerable modules degrade the scan instead of
//! aborting it unless configured otherwise; partially loaded modules always
//! abort with an aggregated diagnostic.
//!
//! Design notes:
//! - The registry is an injected collaborator, never ambient state.
//! - A discovery pass runs once at process start, synchronously. Nothing
//!   here suspends; concurrent passes are correct but duplicate effort.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::capability::Capability;
use crate::error::DiscoveryError;
use crate::filter::ModuleNameFilter;
use crate::fs::{FileProvider, FsFileProvider};
use crate::manifest::{Manifest, TypeKind, TypeMatch};
use crate::registry::{ModuleHandle, ModuleRegistry};

/// File-name suffix a plugin-directory manifest must carry.
pub const MODULE_MANIFEST_SUFFIX: &str = ".module.json";

/// Scans modules for types satisfying a capability.
pub trait TypeFinder: Send + Sync {
    /// Candidate modules for this pass: deduplicated, order-preserving.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::ModuleNotFound`] if a configured extra
    /// module cannot be resolved; no partial result is returned.
    fn list_modules(&self) -> Result<Vec<ModuleHandle>, DiscoveryError>;

    /// Scans the given modules for types satisfying `capability`.
    ///
    /// Interfaces and ignored types never match. With `only_concrete`, the
    /// type must additionally be instantiable.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::TypeLoad`] if a module enumerated only
    /// partially, or [`DiscoveryError::ModuleScan`] if a module's manifest
    /// is unavailable and the finder is configured to treat that as fatal.
    fn find_types_in(
        &self,
        capability: &Capability,
        modules: &[ModuleHandle],
        only_concrete: bool,
    ) -> Result<Vec<TypeMatch>, DiscoveryError>;

    /// Scans every module [`Self::list_modules`] yields.
    ///
    /// # Errors
    ///
    /// Propagates errors of [`Self::list_modules`] and
    /// [`Self::find_types_in`].
    fn find_types(
        &self,
        capability: &Capability,
        only_concrete: bool,
    ) -> Result<Vec<TypeMatch>, DiscoveryError> {
        let modules = self.list_modules()?;
        self.find_types_in(capability, &modules, only_concrete)
    }
}

/// Finder over an injected [`ModuleRegistry`].
pub struct RegistryTypeFinder {
    registry: Arc<dyn ModuleRegistry>,
    filter: ModuleNameFilter,
    scan_loaded: bool,
    extra_modules: Vec<String>,
    ignore_scan_errors: bool,
    strict_plugin_files: bool,
    files: Arc<dyn FileProvider>,
}

impl RegistryTypeFinder {
    #[must_use]
    pub fn new(registry: Arc<dyn ModuleRegistry>) -> Self {
        Self {
            registry,
            filter: ModuleNameFilter::default(),
            scan_loaded: true,
            extra_modules: Vec::new(),
            ignore_scan_errors: true,
            strict_plugin_files: false,
            files: Arc::new(FsFileProvider),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ModuleNameFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Whether registry-loaded modules are enumerated at all. With `false`,
    /// only `extra_modules` participate.
    #[must_use]
    pub fn scan_loaded(mut self, scan_loaded: bool) -> Self {
        self.scan_loaded = scan_loaded;
        self
    }

    /// Module names force-loaded on every pass, bypassing the filter.
    #[must_use]
    pub fn with_extra_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_modules = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether an unenumerable module is skipped (default) or fatal.
    #[must_use]
    pub fn ignore_scan_errors(mut self, ignore: bool) -> Self {
        self.ignore_scan_errors = ignore;
        self
    }

    /// Whether a malformed plugin-directory file aborts the directory scan
    /// instead of being logged and skipped.
    #[must_use]
    pub fn strict_plugin_files(mut self, strict: bool) -> Self {
        self.strict_plugin_files = strict;
        self
    }

    #[must_use]
    pub fn with_file_provider(mut self, files: Arc<dyn FileProvider>) -> Self {
        self.files = files;
        self
    }

    /// Activates modules named by `*.module.json` manifests under `dir`.
    ///
    /// A missing directory is a no-op. Manifests naming modules that fail
    /// the filter or are already loaded are skipped silently; malformed
    /// files and unresolvable names are logged and skipped unless strict
    /// mode is on. Plugin directories legitimately contain artifacts that
    /// are not module manifests.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::PluginDir`] if the directory cannot be
    /// listed, and [`DiscoveryError::PluginFile`] for the first malformed
    /// file when strict mode is on.
    pub fn load_modules_from_dir(&self, dir: &Path) -> Result<(), DiscoveryError> {
        if !self.files.dir_exists(dir) {
            tracing::debug!(dir = %dir.display(), "plugin directory does not exist; nothing to load");
            return Ok(());
        }

        let files = self
            .files
            .list_files(dir, MODULE_MANIFEST_SUFFIX)
            .map_err(|e| DiscoveryError::PluginDir {
                path: dir.to_path_buf(),
                source: e,
            })?;

        let loaded: HashSet<&'static str> = self
            .registry
            .list_loaded()
            .iter()
            .map(ModuleHandle::name)
            .collect();

        for file in files {
            let name = match self.read_manifest_name(&file) {
                Ok(name) => name,
                Err(e) if self.strict_plugin_files => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed plugin file");
                    continue;
                }
            };

            if !self.filter.should_scan(&name) {
                tracing::debug!(module = %name, "plugin manifest filtered out");
                continue;
            }
            if loaded.contains(name.as_str()) {
                continue;
            }

            match self.registry.load(&name) {
                Ok(_) => tracing::debug!(module = %name, file = %file.display(), "plugin module loaded"),
                Err(e) if self.strict_plugin_files => {
                    return Err(DiscoveryError::PluginFile {
                        path: file,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(module = %name, error = %e, "skipping unresolvable plugin module");
                }
            }
        }
        Ok(())
    }

    fn read_manifest_name(&self, file: &Path) -> Result<String, DiscoveryError> {
        #[derive(Deserialize)]
        struct PluginManifest {
            module: String,
        }

        let malformed = |reason: String| DiscoveryError::PluginFile {
            path: file.to_path_buf(),
            reason,
        };

        let raw = self
            .files
            .read_to_string(file)
            .map_err(|e| malformed(e.to_string()))?;
        let manifest: PluginManifest =
            serde_json::from_str(&raw).map_err(|e| malformed(e.to_string()))?;
        if manifest.module.is_empty() {
            return Err(malformed("empty module name".to_owned()));
        }
        Ok(manifest.module)
    }
}

impl TypeFinder for RegistryTypeFinder {
    fn list_modules(&self) -> Result<Vec<ModuleHandle>, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut modules = Vec::new();

        if self.scan_loaded {
            for handle in self.registry.list_loaded() {
                if self.filter.should_scan(handle.name()) && seen.insert(handle.name()) {
                    modules.push(handle);
                }
            }
        }

        // Explicitly named modules are configuration, not discovery: they
        // bypass the filter, and failure to resolve one is fatal.
        for name in &self.extra_modules {
            let handle =
                self.registry
                    .load(name)
                    .map_err(|e| DiscoveryError::ModuleNotFound {
                        module: name.clone(),
                        source: e,
                    })?;
            if seen.insert(handle.name()) {
                modules.push(handle);
            }
        }

        Ok(modules)
    }

    fn find_types_in(
        &self,
        capability: &Capability,
        modules: &[ModuleHandle],
        only_concrete: bool,
    ) -> Result<Vec<TypeMatch>, DiscoveryError> {
        let mut matches = Vec::new();

        for module in modules {
            let entries = match module.manifest() {
                Manifest::Ready(entries) => entries,
                Manifest::Unavailable { reason } => {
                    if self.ignore_scan_errors {
                        tracing::warn!(
                            module = module.name(),
                            %reason,
                            "skipping module; type manifest unavailable"
                        );
                        continue;
                    }
                    return Err(DiscoveryError::ModuleScan {
                        module: module.name().to_owned(),
                        reason,
                    });
                }
                Manifest::Partial { errors, .. } => {
                    return Err(DiscoveryError::TypeLoad {
                        module: module.name().to_owned(),
                        details: errors.join("; "),
                    });
                }
            };

            for entry in entries {
                if entry.kind() == TypeKind::Interface || entry.is_ignored() {
                    continue;
                }
                if !entry.satisfies(capability) {
                    continue;
                }
                if only_concrete && entry.kind() != TypeKind::Concrete {
                    continue;
                }
                matches.push(TypeMatch {
                    module: module.name(),
                    entry,
                });
            }
        }

        tracing::debug!(
            capability = ?capability.id(),
            count = matches.len(),
            "type scan complete"
        );
        Ok(matches)
    }
}
