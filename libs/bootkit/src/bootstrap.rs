//! Bootstrap glue: discovery to a serving application.
//!
//! Phase order: **discover → services → host → routes**. Each phase folds
//! over the ordered startups; any startup failure aborts the build. The
//! glue itself has no behavior beyond driving the hooks and mounting the
//! optional route prefix.

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigProvider, DiscoveryConfig};
use crate::error::DiscoveryError;
use crate::filter::ModuleNameFilter;
use crate::finder::{RegistryTypeFinder, TypeFinder};
use crate::host::HostBuilder;
use crate::hub::ServiceHub;
use crate::plugin_dir::PluginDirTypeFinder;
use crate::registry::ModuleRegistry;
use crate::route_prefix::RoutePrefix;
use crate::startup;

/// Everything `build` needs: the injected registry, the discovery knobs,
/// and the per-startup config sections.
pub struct BootstrapOptions {
    pub registry: Arc<dyn ModuleRegistry>,
    pub discovery: DiscoveryConfig,
    pub sections: Arc<dyn ConfigProvider>,
    /// Optional prefix the composed router is nested under.
    pub route_prefix: Option<RoutePrefix>,
}

impl BootstrapOptions {
    #[must_use]
    pub fn new(registry: Arc<dyn ModuleRegistry>, sections: Arc<dyn ConfigProvider>) -> Self {
        Self {
            registry,
            discovery: DiscoveryConfig::default(),
            sections,
            route_prefix: None,
        }
    }

    #[must_use]
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    #[must_use]
    pub fn with_route_prefix(mut self, prefix: RoutePrefix) -> Self {
        self.route_prefix = Some(prefix);
        self
    }
}

/// A fully wired application, ready to serve.
pub struct App {
    pub services: Arc<ServiceHub>,
    pub router: Router,
    pub host: HostBuilder,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App").finish_non_exhaustive()
    }
}

impl App {
    /// Serves the router until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Propagates bind and server errors from the host.
    pub async fn serve(self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.host.serve(self.router, cancel).await
    }
}

/// Builds the finder the options describe: a plain registry finder, wrapped
/// with plugin-directory loading when a directory is configured.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidPattern`] if a configured pattern does
/// not compile.
pub fn finder_from_config(
    registry: Arc<dyn ModuleRegistry>,
    cfg: &DiscoveryConfig,
) -> Result<Box<dyn TypeFinder>, DiscoveryError> {
    let filter = ModuleNameFilter::new(&cfg.skip_pattern, &cfg.allow_pattern)?;
    let finder = RegistryTypeFinder::new(registry)
        .with_filter(filter)
        .scan_loaded(cfg.scan_loaded)
        .with_extra_modules(cfg.extra_modules.iter().cloned())
        .ignore_scan_errors(cfg.ignore_scan_errors)
        .strict_plugin_files(cfg.strict_plugin_files);

    Ok(match &cfg.plugin_dir {
        Some(dir) => Box::new(
            PluginDirTypeFinder::new(finder, dir.clone()).ensure_plugin_dir(cfg.ensure_plugin_dir),
        ),
        None => Box::new(finder),
    })
}

/// Runs discovery and every lifecycle hook, producing a ready [`App`].
///
/// # Errors
///
/// Propagates discovery errors and any `configure_services` failure; a
/// partially configured application never comes back.
pub fn build(opts: &BootstrapOptions) -> anyhow::Result<App> {
    let finder = finder_from_config(opts.registry.clone(), &opts.discovery)?;

    tracing::info!("Phase: discover");
    let startups = startup::ordered_startups(finder.as_ref())?;
    for s in &startups {
        tracing::debug!(module = s.module, startup = s.type_name, order = s.startup.order(), "discovered startup");
    }

    tracing::info!("Phase: services");
    let services = Arc::new(ServiceHub::new());
    for s in &startups {
        s.startup
            .configure_services(&services, opts.sections.as_ref())
            .map_err(|e| e.context(format!("configure_services failed for '{}'", s.type_name)))?;
    }

    tracing::info!("Phase: host");
    let mut host = HostBuilder::default();
    for s in &startups {
        s.startup.configure_host(&mut host);
    }

    tracing::info!("Phase: routes");
    let mut router = Router::new();
    for s in &startups {
        router = s.startup.configure(router);
    }
    if let Some(prefix) = &opts.route_prefix {
        router = prefix.mount(router);
    }

    Ok(App {
        services,
        router,
        host,
    })
}

/// Builds and serves, with Ctrl-C wired to graceful shutdown.
///
/// # Errors
///
/// Propagates build and serve errors.
pub async fn run(opts: BootstrapOptions) -> anyhow::Result<()> {
    let app = build(&opts)?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("shutdown: signal received"),
            Err(e) => tracing::warn!(error = %e, "shutdown: signal waiter failed"),
        }
        signal_cancel.cancel();
    });

    app.serve(cancel).await
}
