//! Node status plugin.
//!
//! A small real module packaged the way plugins are expected to be
//! packaged: it registers itself at link time, exposes a [`NodeStatusApi`]
//! service through the hub, and contributes a `GET /status` route. The
//! host never references this crate beyond linking it.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use bootkit::{
    config::{section_or_default, ConfigProvider},
    startup_entry, AppStartup, Manifest, ServiceHub,
};

/// Snapshot of the running node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Read side of the node status service. Other modules resolve this from
/// the hub; the HTTP route is just one consumer.
pub trait NodeStatusApi: Send + Sync {
    fn snapshot(&self) -> NodeStatus;
}

struct LocalNodeStatus {
    node: String,
    started: Instant,
}

impl LocalNodeStatus {
    fn new(node: String) -> Self {
        Self {
            node,
            started: Instant::now(),
        }
    }
}

impl NodeStatusApi for LocalNodeStatus {
    fn snapshot(&self) -> NodeStatus {
        NodeStatus {
            node: self.node.clone(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct NodeStatusConfig {
    /// Reported node name; falls back to the machine hostname.
    node_name: Option<String>,
}

/// Startup wiring for the node status service and route.
#[derive(Default)]
pub struct NodeStatusStartup {
    api: OnceLock<Arc<dyn NodeStatusApi>>,
}

impl AppStartup for NodeStatusStartup {
    fn order(&self) -> i32 {
        10
    }

    fn configure_services(
        &self,
        services: &ServiceHub,
        config: &dyn ConfigProvider,
    ) -> anyhow::Result<()> {
        let cfg: NodeStatusConfig = section_or_default(config, "node_status")?;
        let node = cfg.node_name.unwrap_or_else(default_node_name);

        let api: Arc<dyn NodeStatusApi> = Arc::new(LocalNodeStatus::new(node));
        services.register::<dyn NodeStatusApi>(api.clone());
        self.api
            .set(api)
            .map_err(|_| anyhow::anyhow!("node status configured twice"))?;

        tracing::info!("node status service registered");
        Ok(())
    }

    fn configure(&self, router: Router) -> Router {
        let Some(api) = self.api.get().cloned() else {
            return router;
        };
        router.route(
            "/status",
            get(move || {
                let api = api.clone();
                async move { Json(api.snapshot()) }
            }),
        )
    }
}

fn default_node_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "node".to_owned())
}

fn manifest() -> Manifest {
    Manifest::Ready(vec![startup_entry::<NodeStatusStartup>(
        "node_status::NodeStatusStartup",
    )])
}

bootkit::register_module!(name: "node_status", manifest: manifest);
