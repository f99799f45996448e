//! One-shot full catalog sync. Exits non-zero when the run aborts
//! (authentication or category-tree failure); per-category skips are
//! reported in the summary but do not fail the invocation.

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
    let report = orch.run_full_sync().await.context("full sync aborted")?;

    if !report.failed_categories.is_empty() {
        warn!(
            failed_categories = ?report.failed_categories,
            "some categories were skipped this run"
        );
    }
    info!(
        categories = report.categories,
        products = report.products,
        images = report.images,
        "sync complete"
    );
    Ok(())
}
