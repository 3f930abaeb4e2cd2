//! Plugin-directory aware finder.
//!
//! Wraps a [`RegistryTypeFinder`] so that the first successful enumeration
//! also activates modules named by manifests in a plugin directory. The
//! latch is set only after the directory scan succeeds, so a failed scan is
//! retried on the next pass; concurrent first passes may duplicate the scan
//! but activation is idempotent, so the result stays correct.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::capability::Capability;
use crate::error::DiscoveryError;
use crate::finder::{RegistryTypeFinder, TypeFinder};
use crate::manifest::TypeMatch;
use crate::registry::ModuleHandle;

pub struct PluginDirTypeFinder {
    inner: RegistryTypeFinder,
    plugin_dir: PathBuf,
    ensure_plugin_dir: bool,
    dir_loaded: AtomicBool,
}

impl PluginDirTypeFinder {
    #[must_use]
    pub fn new(inner: RegistryTypeFinder, plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            plugin_dir: plugin_dir.into(),
            ensure_plugin_dir: true,
            dir_loaded: AtomicBool::new(false),
        }
    }

    /// Toggles the directory scan entirely.
    #[must_use]
    pub fn ensure_plugin_dir(mut self, ensure: bool) -> Self {
        self.ensure_plugin_dir = ensure;
        self
    }

    #[must_use]
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    fn ensure_dir_modules_loaded(&self) -> Result<(), DiscoveryError> {
        if !self.ensure_plugin_dir || self.dir_loaded.load(Ordering::Acquire) {
            return Ok(());
        }
        self.inner.load_modules_from_dir(&self.plugin_dir)?;
        self.dir_loaded.store(true, Ordering::Release);
        Ok(())
    }
}

impl TypeFinder for PluginDirTypeFinder {
    fn list_modules(&self) -> Result<Vec<ModuleHandle>, DiscoveryError> {
        self.ensure_dir_modules_loaded()?;
        self.inner.list_modules()
    }

    fn find_types_in(
        &self,
        capability: &Capability,
        modules: &[ModuleHandle],
        only_concrete: bool,
    ) -> Result<Vec<TypeMatch>, DiscoveryError> {
        self.inner.find_types_in(capability, modules, only_concrete)
    }
}
