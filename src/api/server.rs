// Dashboard server implementation using actix-web

use crate::api::routes;
use crate::orchestrator::SyncOrchestrator;
use crate::store::CatalogStore;
use crate::util::env as env_util;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state handed to every handler.
pub struct AppState {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub store: Arc<dyn CatalogStore>,
    /// When set, a page view attempts a live full sync before rendering.
    pub sync_on_view: bool,
    pub started_at: Instant,
}

pub struct DashboardServer {
    pub host: String,
    pub port: u16,
}

impl DashboardServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();

        let host = env_util::env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_util::env_opt("API_PORT")
            .unwrap_or_else(|| "10000".to_string())
            .parse()
            .context("Invalid API_PORT")?;

        Ok(Self { host, port })
    }

    /// Start the HTTP server
    pub async fn run(
        self,
        orchestrator: Arc<SyncOrchestrator>,
        store: Arc<dyn CatalogStore>,
    ) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            "starting netlab-sync dashboard"
        );

        let state = web::Data::new(AppState {
            orchestrator,
            store,
            sync_on_view: env_util::env_flag("SYNC_ON_VIEW", false),
            started_at: Instant::now(),
        });

        HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(middleware::Logger::default())
                .wrap(middleware::Compress::default())
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
