use anyhow::{Context, Result};
use netlab_sync::api::DashboardServer;
use netlab_sync::orchestrator::SyncOrchestrator;
use netlab_sync::store::{memory::MemoryStore, pg::PgCatalogStore, CatalogStore};
use netlab_sync::util::db::Db;
use netlab_sync::util::env as env_util;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

const LIVE_REQUIRED_ENV: &[&str] = &[
    "NETLAB_LOGIN",
    "NETLAB_PASSWORD",
    "NETLAB_AUTH_URL",
    "NETLAB_REST_URL",
    "NETLAB_CATALOG",
];

const SNAPSHOT_ENV: &[&str] = &[
    "CATALOG_SOURCE",
    "NETLAB_AUTH_URL",
    "NETLAB_REST_URL",
    "NETLAB_CATALOG",
    "DATABASE_URL",
    "API_HOST",
    "API_PORT",
    "SYNC_LOOP_SECS",
    "PRICE_REFRESH_SECS",
    "SYNC_ON_VIEW",
];

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    netlab_sync::tracing::init_tracing("info,sqlx=warn")?;

    // --- configuration preflight --------------------------------------------
    let fixture_mode = matches!(
        env_util::env_opt("CATALOG_SOURCE").as_deref(),
        Some("fixture") | Some("mock")
    );
    let required: &[&str] = if fixture_mode { &[] } else { LIVE_REQUIRED_ENV };
    env_util::preflight_check("netlab-sync", required, SNAPSHOT_ENV)?;

    // --- catalog store -------------------------------------------------------
    let store: Arc<dyn CatalogStore> = match env_util::db_url() {
        Ok(url) => {
            let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 10);
            let db = Db::connect(&url, max_conns)
                .await
                .context("Db::connect failed")?;
            Arc::new(PgCatalogStore::new(db))
        }
        Err(_) if fixture_mode => {
            // The demo catalog works without any database at all.
            info!("no database configured; fixture mode uses the in-memory store");
            Arc::new(MemoryStore::new())
        }
        Err(err) => {
            return Err(err.context("live mode requires DATABASE_URL (or DB_URL)"));
        }
    };

    // --- vendor source + orchestrator ---------------------------------------
    let source = netlab_sync::vendor::source_from_env()?;
    let catalog_name =
        env_util::env_opt("NETLAB_CATALOG").unwrap_or_else(|| "demo".to_string());
    let orchestrator = Arc::new(SyncOrchestrator::new(source, store.clone(), catalog_name));

    // --- background cycles ---------------------------------------------------
    // Two independent cadences over the shared store; a failure in one never
    // blocks the other's schedule.
    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    let mut tasks = JoinSet::new();

    {
        let orch = orchestrator.clone();
        let mut rx = shutdown_tx.subscribe();
        let secs: u64 = env_util::env_parse("SYNC_LOOP_SECS", 3600);
        tasks.spawn(async move {
            // drift-free interval; immediate first tick
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                info!("catalog_sync: tick");
                match orch.run_full_sync().await {
                    Ok(report) => info!(
                        categories = report.categories,
                        products = report.products,
                        images = report.images,
                        failed_categories = report.failed_categories.len(),
                        "catalog_sync: run complete"
                    ),
                    Err(e) => {
                        warn!(error = %e, "catalog_sync: run failed; readers keep last-known-good data")
                    }
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = rx.recv() => {
                        info!("catalog_sync: shutdown");
                        break;
                    }
                }
            }
        });
    }

    {
        let orch = orchestrator.clone();
        let mut rx = shutdown_tx.subscribe();
        let secs: u64 = env_util::env_parse("PRICE_REFRESH_SECS", 1800);
        tasks.spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                info!("price_refresh: tick");
                match orch.run_price_refresh().await {
                    Ok(report) => info!(
                        refreshed = report.refreshed,
                        skipped = report.skipped.len(),
                        "price_refresh: cycle complete"
                    ),
                    Err(e) => warn!(error = %e, "price_refresh: cycle failed"),
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = rx.recv() => {
                        info!("price_refresh: shutdown");
                        break;
                    }
                }
            }
        });
    }

    // --- dashboard (blocks until Ctrl+C) ------------------------------------
    let server = DashboardServer::from_env()?;
    info!("service started; press Ctrl+C to stop");
    server.run(orchestrator.clone(), store.clone()).await?;

    let _ = shutdown_tx.send(());
    info!("shutdown: gracefully stopping {} task(s)...", tasks.len());
    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            error!(error = %e, "task join error");
        }
    }

    info!("all tasks stopped");
    Ok(())
}
