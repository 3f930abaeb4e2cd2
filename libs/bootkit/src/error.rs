//! Error taxonomy for the discovery pipeline.
//!
//! Fatal conditions propagate to the caller of the top-level discovery
//! operation; recoverable ones are logged at the site that tolerates them.
//! There are no retries: module activation and startup construction are
//! deterministic, so retrying with the same inputs cannot succeed.

use std::path::PathBuf;

use crate::registry::RegistryError;

/// Errors surfaced by type finders and startup discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// A filter pattern did not compile. Raised at construction, never
    /// during a scan.
    #[error("invalid {which} pattern '{pattern}': {source}")]
    InvalidPattern {
        which: &'static str,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// An explicitly configured module name could not be resolved.
    /// Always fatal: a named dependency that cannot load is misconfiguration.
    #[error("explicitly configured module '{module}' cannot be resolved")]
    ModuleNotFound {
        module: String,
        #[source]
        source: RegistryError,
    },

    /// A module's type manifest could not be obtained. Only raised when the
    /// finder is configured to treat scan degradation as fatal; the default
    /// is to log and skip the module.
    #[error("cannot enumerate types of module '{module}': {reason}")]
    ModuleScan { module: String, reason: String },

    /// One or more exported types of a module failed to load. All underlying
    /// messages are merged into `details`; a partially corrupted result set
    /// is never returned.
    #[error("type load failures in module '{module}': {details}")]
    TypeLoad { module: String, details: String },

    /// A file in the plugin directory is not a valid module manifest.
    /// Only raised in strict mode; the tolerant default logs and skips.
    #[error("malformed plugin file '{}': {reason}", path.display())]
    PluginFile { path: PathBuf, reason: String },

    /// The plugin directory itself could not be listed.
    #[error("cannot read plugin directory '{}'", path.display())]
    PluginDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A discovered startup type could not be constructed. Always fatal:
    /// silently dropping a broken plugin could leave required services
    /// unregistered.
    #[error("failed to construct startup type '{type_name}'")]
    Construction {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },
}
