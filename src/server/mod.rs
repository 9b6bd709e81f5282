// Gateway server module
// HTTP routes the browser calls; each one proxies to the analysis service

mod error;
mod handlers;

pub use error::{GatewayError, GatewayResult};
pub use handlers::{
    create_router, handle_analyze, handle_check_api_key, handle_health, handle_personas,
    handle_speech, handle_upload, AnalyzeBody, SpeechBody,
};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::backend::BackendClient;
use crate::config::Config;

/// Shared state handed to every handler
pub struct GatewayState {
    backend: BackendClient,
    config: Config,
}

impl GatewayState {
    pub fn new(config: Config) -> Result<Self> {
        let backend = BackendClient::new(config.backend.clone())?;
        Ok(Self { backend, config })
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// The gateway server
pub struct GatewayServer {
    state: Arc<GatewayState>,
}

impl GatewayServer {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            state: Arc::new(GatewayState::new(config)?),
        })
    }

    pub fn state(&self) -> &Arc<GatewayState> {
        &self.state
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .state
            .config()
            .server
            .bind_address
            .parse()
            .with_context(|| {
                format!(
                    "Invalid bind address: {}",
                    self.state.config().server.bind_address
                )
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        self.serve_with_listener(listener).await
    }

    /// Serve on an already-bound listener (tests bind 127.0.0.1:0)
    pub async fn serve_with_listener(self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        tracing::info!(
            "Deck debater gateway listening on http://{} (analysis service: {})",
            local,
            self.state.backend().base_url()
        );
        if !self.state.config().credential_loaded() {
            tracing::warn!(
                "{} is not set; the analysis service may refuse requests",
                self.state.config().credential_env
            );
        }

        let app = create_router(Arc::clone(&self.state));
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
