//! Plugin discovery and application bootstrap for an axum host.
//!
//! Independently packaged plugin crates register a module definition into a
//! process-wide table at link time; the host enumerates those modules,
//! filters them by name, scans their exported types for the startup
//! capability, and invokes each discovered startup's lifecycle hooks to
//! assemble services, routes, and host settings. The host never names its
//! plugins ahead of time.
//!
//! ```no_run
//! use std::sync::Arc;
//! use bootkit::{bootstrap, config::JsonConfig, registry::StaticModuleRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     bootkit::telemetry::init_logging();
//!     let registry = Arc::new(StaticModuleRegistry::from_inventory()?);
//!     let opts = bootstrap::BootstrapOptions::new(registry, Arc::new(JsonConfig::new()));
//!     bootstrap::run(opts).await
//! }
//! ```

pub mod bootstrap;
pub mod capability;
pub mod config;
pub mod error;
pub mod filter;
pub mod finder;
pub mod fs;
pub mod host;
pub mod hub;
pub mod manifest;
pub mod plugin_dir;
pub mod registry;
pub mod route_prefix;
pub mod startup;
pub mod telemetry;

pub use capability::{Capability, CapabilityId, CapabilityRef};
pub use config::{ConfigProvider, DiscoveryConfig, JsonConfig};
pub use error::DiscoveryError;
pub use filter::ModuleNameFilter;
pub use finder::{RegistryTypeFinder, TypeFinder};
pub use host::HostBuilder;
pub use hub::{ServiceHub, ServiceHubError};
pub use manifest::{Manifest, TypeEntry, TypeKind, TypeMatch};
pub use plugin_dir::PluginDirTypeFinder;
pub use registry::{ModuleDef, ModuleHandle, ModuleRegistry, StaticModuleRegistry};
pub use route_prefix::RoutePrefix;
pub use startup::{ordered_startups, startup_entry, AppStartup, StartupModule};

// Re-exported for `register_module!` expansions in plugin crates.
pub use inventory;

/// Registers a module definition into the process-wide table.
///
/// ```ignore
/// fn manifest() -> bootkit::Manifest {
///     bootkit::Manifest::Ready(vec![
///         bootkit::startup_entry::<MyStartup>("my_plugin::MyStartup"),
///     ])
/// }
/// bootkit::register_module!(name: "my_plugin", manifest: manifest);
/// ```
///
/// A module registered `lazy` is known to the registry but participates in
/// scans only once something loads it by name (extra-module configuration
/// or a plugin-directory manifest).
#[macro_export]
macro_rules! register_module {
    (name: $name:expr, manifest: $manifest:path $(,)?) => {
        $crate::inventory::submit! {
            $crate::ModuleDef::new($name, true, $manifest)
        }
    };
    (name: $name:expr, lazy, manifest: $manifest:path $(,)?) => {
        $crate::inventory::submit! {
            $crate::ModuleDef::new($name, false, $manifest)
        }
    };
}
