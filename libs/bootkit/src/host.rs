//! Host-level settings startups may adjust via `configure_host`, plus the
//! single async surface of the crate: serving the composed router.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;

/// Carrier of host settings. Built with defaults by the bootstrap glue and
/// passed mutably through every startup's `configure_host`.
#[derive(Debug, Clone)]
pub struct HostBuilder {
    bind_addr: SocketAddr,
    server_name: String,
    shutdown_grace: Duration,
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            server_name: "bootkit".to_owned(),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl HostBuilder {
    pub fn set_bind_addr(&mut self, addr: SocketAddr) -> &mut Self {
        self.bind_addr = addr;
        self
    }

    pub fn set_server_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.server_name = name.into();
        self
    }

    /// How long in-flight connections get to finish after shutdown begins.
    pub fn set_shutdown_grace(&mut self, grace: Duration) -> &mut Self {
        self.shutdown_grace = grace;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    /// Binds the configured address and serves `router` until `cancel`
    /// fires, then drains in-flight connections within the grace period.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn serve(self, router: Router, cancel: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, server = %self.server_name, "listening");

        let graceful = {
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
                tracing::info!("shutdown requested; draining connections");
            }
        };
        let server = axum::serve(listener, router).with_graceful_shutdown(graceful);
        let server = std::pin::pin!(server.into_future());

        let deadline = async {
            cancel.cancelled().await;
            tokio::time::sleep(self.shutdown_grace).await;
        };

        tokio::select! {
            result = server => result.map_err(Into::into),
            () = deadline => {
                tracing::warn!(
                    grace = ?self.shutdown_grace,
                    "grace period elapsed; aborting remaining connections"
                );
                Ok(())
            }
        }
    }
}
