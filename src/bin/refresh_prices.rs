//! One-shot price refresh over all active (non-deleted) products.

use anyhow::{Context, Result};
use netlab_sync::orchestrator::SyncOrchestrator;
use netlab_sync::store::{pg::PgCatalogStore, CatalogStore};
use netlab_sync::util::db::Db;
use netlab_sync::util::env as env_util;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    netlab_sync::tracing::init_tracing("info,sqlx=warn")?;

    let url = env_util::db_url()?;
    let db = Db::connect(&url, 5).await.context("Db::connect failed")?;
    let store: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(db));

    let source = netlab_sync::vendor::source_from_env()?;
    let catalog_name =
        env_util::env_opt("NETLAB_CATALOG").unwrap_or_else(|| "demo".to_string());

    let orch = SyncOrchestrator::new(source, store, catalog_name);
    let report = orch
        .run_price_refresh()
        .await
        .context("price refresh aborted")?;

    if !report.skipped.is_empty() {
        warn!(skipped = ?report.skipped, "some products were skipped this cycle");
    }
    info!(refreshed = report.refreshed, "price refresh complete");
    Ok(())
}
