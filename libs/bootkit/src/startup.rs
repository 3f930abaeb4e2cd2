//! The startup contract and its discovery.
//!
//! A startup is the plugin-provided component whose lifecycle hooks run
//! during application bootstrap. All hooks are optional and synchronous:
//! discovery and wiring run once at process start, before request handling
//! begins.

use std::any::Any;

use axum::Router;

use crate::capability::{Capability, CapabilityId, CapabilityRef};
use crate::config::ConfigProvider;
use crate::error::DiscoveryError;
use crate::finder::TypeFinder;
use crate::host::HostBuilder;
use crate::hub::ServiceHub;
use crate::manifest::TypeEntry;

/// Capability every startup type declares.
pub const STARTUP_CAPABILITY: CapabilityId = CapabilityId::new("bootkit.app_startup", 0);

/// Lifecycle hooks invoked against the host's builders. Each hook defaults
/// to a no-op so a plugin implements only what it needs.
pub trait AppStartup: Send + Sync + 'static {
    /// Sort key for hook invocation; lower runs earlier. Ties keep
    /// discovery order.
    fn order(&self) -> i32 {
        0
    }

    /// Registers services into the hub.
    ///
    /// # Errors
    ///
    /// Any error aborts the bootstrap; a partially configured application
    /// must not start.
    fn configure_services(
        &self,
        services: &ServiceHub,
        config: &dyn ConfigProvider,
    ) -> anyhow::Result<()> {
        let (_, _) = (services, config);
        Ok(())
    }

    /// Contributes routes and middleware to the router.
    fn configure(&self, router: Router) -> Router {
        router
    }

    /// Adjusts host-level settings (bind address, shutdown grace).
    fn configure_host(&self, host: &mut HostBuilder) {
        let _ = host;
    }
}

/// A discovered, constructed startup paired with its origin.
pub struct StartupModule {
    pub module: &'static str,
    pub type_name: &'static str,
    pub startup: Box<dyn AppStartup>,
}

impl std::fmt::Debug for StartupModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupModule")
            .field("module", &self.module)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Builds a manifest entry for a startup type with a `Default` constructor.
/// The factory wraps the startup as `Box<dyn AppStartup>` inside the opaque
/// payload; [`ordered_startups`] downcasts it back.
#[must_use]
pub fn startup_entry<T>(type_name: &'static str) -> TypeEntry
where
    T: AppStartup + Default,
{
    TypeEntry::concrete(type_name)
        .with_capability(CapabilityRef::plain(STARTUP_CAPABILITY))
        .with_factory(construct::<T>)
}

fn construct<T: AppStartup + Default>() -> anyhow::Result<Box<dyn Any + Send + Sync>> {
    Ok(Box::new(Box::new(T::default()) as Box<dyn AppStartup>))
}

/// Finds all concrete startup types, constructs each via its factory, and
/// returns them sorted ascending by [`AppStartup::order`]. The sort is
/// stable: equal orders keep discovery order.
///
/// # Errors
///
/// Propagates finder errors, and returns [`DiscoveryError::Construction`]
/// if any candidate lacks a factory, its factory fails, or the payload is
/// not a startup. A broken plugin is never silently dropped.
pub fn ordered_startups(finder: &dyn TypeFinder) -> Result<Vec<StartupModule>, DiscoveryError> {
    let candidates = finder.find_types(&Capability::unbound(STARTUP_CAPABILITY), true)?;

    let mut startups = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let type_name = candidate.entry.type_name();
        let construction_error = |source: anyhow::Error| DiscoveryError::Construction {
            type_name: type_name.to_owned(),
            source,
        };

        let factory = candidate
            .entry
            .factory()
            .ok_or_else(|| construction_error(anyhow::anyhow!("no factory registered")))?;
        let payload = factory().map_err(construction_error)?;
        let startup = payload
            .downcast::<Box<dyn AppStartup>>()
            .map_err(|_| construction_error(anyhow::anyhow!("factory payload is not a startup")))?;

        startups.push(StartupModule {
            module: candidate.module,
            type_name,
            startup: *startup,
        });
    }

    startups.sort_by_key(|s| s.startup.order());
    tracing::debug!(count = startups.len(), "startup discovery complete");
    Ok(startups)
}
