//! The sync core: two independently scheduled cycles sharing the vendor
//! source and the catalog store.
//!
//! Full catalog sync: authenticate → category tree (all-or-nothing) →
//! per-category products and images (best-effort, skip on failure). Price
//! refresh: authenticate → active product ids → per-product price upsert
//! (best-effort). Abort semantics differ deliberately: a category-tree
//! failure leaves the store untouched so readers keep last-known-good data,
//! while a single bad category or product never blocks the rest of a batch.

use crate::catalog::{Category, Product};
use crate::error::SyncError;
use crate::normalize;
use crate::store::CatalogStore;
use crate::vendor::CatalogSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Injected time source; tests pin it, production passes `Utc::now`.
pub type Clock = fn() -> DateTime<Utc>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub categories: usize,
    pub products: usize,
    pub images: usize,
    /// Categories whose product fetch failed and was skipped this run.
    pub failed_categories: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceReport {
    pub refreshed: usize,
    /// Product ids whose price fetch failed and was skipped this cycle.
    pub skipped: Vec<i64>,
}

pub struct SyncOrchestrator {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn CatalogStore>,
    catalog_name: String,
    fetch_images: bool,
    clock: Clock,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn CatalogStore>,
        catalog_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            catalog_name: catalog_name.into(),
            fetch_images: true,
            clock: Utc::now,
        }
    }

    pub fn with_images(mut self, fetch_images: bool) -> Self {
        self.fetch_images = fetch_images;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// One full catalog sync run.
    ///
    /// Auth or category-tree failure aborts before/without partial tree
    /// writes. Store failures are fatal and surfaced. Per-category product
    /// and image failures are logged, counted and skipped.
    pub async fn run_full_sync(&self) -> Result<SyncReport, SyncError> {
        let token = self.source.authenticate().await?;

        let raw_categories = self
            .source
            .list_categories(&token, &self.catalog_name)
            .await?;
        let categories: Vec<Category> = raw_categories
            .iter()
            .filter_map(normalize::category_from_raw)
            .collect();
        self.store.upsert_categories(&categories).await?;

        let mut report = SyncReport {
            categories: categories.len(),
            ..Default::default()
        };

        // Remote order, no re-ordering.
        for category in &categories {
            let raw_products = match self
                .source
                .list_products(&token, &self.catalog_name, category.id)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        target = "sync",
                        category_id = category.id,
                        error = %e,
                        "product fetch failed; skipping category this run"
                    );
                    report.failed_categories.push(category.id);
                    continue;
                }
            };
            let products: Vec<Product> = raw_products
                .iter()
                .filter_map(|r| normalize::product_from_raw(r, category.id))
                .collect();
            self.store.upsert_products(&products).await?;
            report.products += products.len();

            if self.fetch_images {
                match self.source.list_images(&token, category.id).await {
                    Ok(raw) => {
                        for rec in &raw {
                            for img in normalize::images_from_raw(rec) {
                                self.store.append_image(img.goods_id, &img.url).await?;
                                report.images += 1;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            target = "sync",
                            category_id = category.id,
                            error = %e,
                            "image fetch failed; skipping"
                        );
                    }
                }
            }
        }

        info!(
            target = "sync",
            categories = report.categories,
            products = report.products,
            images = report.images,
            failed_categories = report.failed_categories.len(),
            "full sync complete"
        );
        Ok(report)
    }

    /// One price-refresh cycle over all active (non-deleted) products.
    /// A fresh token every cycle; one bad product never aborts the batch.
    pub async fn run_price_refresh(&self) -> Result<PriceReport, SyncError> {
        let token = self.source.authenticate().await?;
        let ids = self.store.list_active_product_ids().await?;

        let mut report = PriceReport::default();
        for goods_id in ids {
            match self.source.price_and_quantity(&token, goods_id).await {
                Ok(rec) => {
                    let quote = normalize::price_from_raw(&rec);
                    self.store
                        .upsert_price(goods_id, &quote, (self.clock)())
                        .await?;
                    report.refreshed += 1;
                }
                Err(e) => {
                    warn!(
                        target = "sync",
                        goods_id,
                        error = %e,
                        "price fetch failed; skipping product this cycle"
                    );
                    report.skipped.push(goods_id);
                }
            }
        }

        info!(
            target = "sync",
            refreshed = report.refreshed,
            skipped = report.skipped.len(),
            "price refresh complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::vendor::{xml::RawRecord, Token};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;

    /// Scripted vendor with per-endpoint failure switches.
    #[derive(Default)]
    struct ScriptedSource {
        fail_auth: bool,
        fail_category_tree: bool,
        fail_products_for: Vec<i64>,
        fail_price_for: Vec<i64>,
        categories: Vec<(i64, &'static str)>,
        /// category id -> (product id, raw Deleted value)
        products: HashMap<i64, Vec<(i64, &'static str)>>,
        /// product id -> (price, quantity)
        prices: HashMap<i64, (&'static str, &'static str)>,
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn authenticate(&self) -> Result<Token, SyncError> {
            if self.fail_auth {
                return Err(SyncError::authentication("scripted rejection"));
            }
            Ok(Token::test("t"))
        }

        async fn list_categories(
            &self,
            _token: &Token,
            _catalog: &str,
        ) -> Result<Vec<RawRecord>, SyncError> {
            if self.fail_category_tree {
                return Err(SyncError::remote_fetch("categories", "scripted timeout"));
            }
            Ok(self
                .categories
                .iter()
                .map(|&(id, name)| {
                    let id = id.to_string();
                    RawRecord::new(vec![("id", id.as_str()), ("name", name)], vec![])
                })
                .collect())
        }

        async fn list_products(
            &self,
            _token: &Token,
            _catalog: &str,
            category_id: i64,
        ) -> Result<Vec<RawRecord>, SyncError> {
            if self.fail_products_for.contains(&category_id) {
                return Err(SyncError::remote_fetch("goods", "scripted timeout"));
            }
            Ok(self
                .products
                .get(&category_id)
                .map(|rows| {
                    rows.iter()
                        .map(|&(id, deleted)| {
                            let id = id.to_string();
                            RawRecord::new(
                                vec![("id", id.as_str())],
                                vec![("Deleted", deleted)],
                            )
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn list_images(
            &self,
            _token: &Token,
            _category_id: i64,
        ) -> Result<Vec<RawRecord>, SyncError> {
            Ok(Vec::new())
        }

        async fn price_and_quantity(
            &self,
            _token: &Token,
            goods_id: i64,
        ) -> Result<RawRecord, SyncError> {
            if self.fail_price_for.contains(&goods_id) {
                return Err(SyncError::remote_fetch("price", "scripted timeout"));
            }
            Ok(self
                .prices
                .get(&goods_id)
                .map(|&(price, quantity)| {
                    RawRecord::new(vec![], vec![("Price", price), ("Quantity", quantity)])
                })
                .unwrap_or_default())
        }
    }

    fn orchestrator(source: ScriptedSource, store: Arc<MemoryStore>) -> SyncOrchestrator {
        SyncOrchestrator::new(Arc::new(source), store, "demo")
    }

    #[tokio::test]
    async fn empty_store_full_sync_builds_the_tree() {
        let source = ScriptedSource {
            categories: vec![(1, "Servers"), (2, "Networking")],
            products: HashMap::from([
                (1, vec![(101, "false"), (102, "false")]),
                (2, vec![(201, "false")]),
            ]),
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(source, store.clone());

        let report = orch.run_full_sync().await.unwrap();
        assert_eq!(report.categories, 2);
        assert_eq!(report.products, 3);
        assert!(report.failed_categories.is_empty());

        let view = store.read_catalog_view().await.unwrap();
        assert_eq!(view.categories.len(), 2);
        assert_eq!(view.categories[0].products.len(), 2);
        assert_eq!(view.categories[1].products.len(), 1);
    }

    #[tokio::test]
    async fn category_tree_failure_preserves_previous_snapshot() {
        let store = Arc::new(MemoryStore::new());
        // Previous successful run left category 1 -> Servers, product 101.
        store
            .upsert_categories(&[Category {
                id: 1,
                name: "Servers".to_string(),
                parent_id: None,
            }])
            .await
            .unwrap();
        store
            .upsert_products(&[Product {
                id: 101,
                category_id: 1,
                is_deleted: false,
                name: Some("Dell PowerEdge R750".to_string()),
                vendor: Some("Dell".to_string()),
            }])
            .await
            .unwrap();
        let before = store.read_catalog_view().await.unwrap();

        let source = ScriptedSource {
            fail_category_tree: true,
            ..Default::default()
        };
        let orch = orchestrator(source, store.clone());
        let err = orch.run_full_sync().await.unwrap_err();
        assert!(matches!(err, SyncError::RemoteFetch { .. }));

        let after = store.read_catalog_view().await.unwrap();
        assert_eq!(before, after);
        assert_eq!(after.categories[0].category.name, "Servers");
        assert_eq!(after.categories[0].products[0].product.id, 101);
    }

    #[tokio::test]
    async fn auth_failure_aborts_before_any_write() {
        let source = ScriptedSource {
            fail_auth: true,
            categories: vec![(1, "Servers")],
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(source, store.clone());

        let err = orch.run_full_sync().await.unwrap_err();
        assert!(matches!(err, SyncError::Authentication { .. }));
        assert!(store.read_catalog_view().await.unwrap().categories.is_empty());
    }

    #[tokio::test]
    async fn one_failing_category_does_not_block_the_rest() {
        let source = ScriptedSource {
            categories: vec![(1, "Servers"), (2, "Networking"), (3, "Storage")],
            fail_products_for: vec![2],
            products: HashMap::from([
                (1, vec![(101, "false")]),
                (2, vec![(201, "false")]),
                (3, vec![(301, "false")]),
            ]),
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(source, store.clone());

        let report = orch.run_full_sync().await.unwrap();
        assert_eq!(report.failed_categories, vec![2]);
        assert_eq!(report.products, 2);

        let view = store.read_catalog_view().await.unwrap();
        assert_eq!(view.categories.len(), 3);
        assert_eq!(view.categories[0].products.len(), 1);
        assert!(view.categories[1].products.is_empty());
        // Category 3 still synced even though 2 failed before it.
        assert_eq!(view.categories[2].products[0].product.id, 301);
    }

    #[tokio::test]
    async fn deleted_flag_follows_exact_raw_value() {
        let source = ScriptedSource {
            categories: vec![(1, "Servers")],
            products: HashMap::from([(1, vec![(101, "true"), (102, "True"), (103, "false")])]),
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        orchestrator(source, store.clone())
            .run_full_sync()
            .await
            .unwrap();

        assert_eq!(
            store.list_active_product_ids().await.unwrap(),
            vec![102, 103]
        );
    }

    #[tokio::test]
    async fn price_refresh_writes_one_row_per_active_product() {
        // Product 101 starts with no price row; one cycle reports
        // price=12345.00 quantity=7.
        let started = Utc::now();
        let source = ScriptedSource {
            categories: vec![(1, "Servers")],
            products: HashMap::from([(1, vec![(101, "false")])]),
            prices: HashMap::from([(101, ("12345.00", "7"))]),
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(source, store.clone());
        orch.run_full_sync().await.unwrap();

        let report = orch.run_price_refresh().await.unwrap();
        assert_eq!(report.refreshed, 1);
        assert!(report.skipped.is_empty());

        let view = store.read_catalog_view().await.unwrap();
        let price = view.categories[0].products[0].price.clone().unwrap();
        assert_eq!(price.goods_id, 101);
        assert_eq!(price.price.unwrap().to_string(), "12345.00");
        assert_eq!(price.quantity, Some(7));
        assert!(price.updated_at >= started);
    }

    #[tokio::test]
    async fn price_refresh_never_touches_deleted_products() {
        let source = ScriptedSource {
            categories: vec![(1, "Servers")],
            products: HashMap::from([(1, vec![(101, "false"), (102, "true")])]),
            prices: HashMap::from([(101, ("10.00", "1")), (102, ("20.00", "2"))]),
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(source, store.clone());
        orch.run_full_sync().await.unwrap();

        let report = orch.run_price_refresh().await.unwrap();
        assert_eq!(report.refreshed, 1);

        let view = store.read_catalog_view().await.unwrap();
        let products = &view.categories[0].products;
        assert!(products[0].price.is_some());
        assert!(products[1].price.is_none());
    }

    #[tokio::test]
    async fn one_failing_price_does_not_abort_the_cycle() {
        let source = ScriptedSource {
            categories: vec![(1, "Servers")],
            products: HashMap::from([(1, vec![(101, "false"), (102, "false"), (103, "false")])]),
            prices: HashMap::from([(101, ("10.00", "1")), (103, ("30.00", "3"))]),
            fail_price_for: vec![102],
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(source, store.clone());
        orch.run_full_sync().await.unwrap();

        let report = orch.run_price_refresh().await.unwrap();
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.skipped, vec![102]);
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn price_timestamps_come_from_the_injected_clock() {
        let source = ScriptedSource {
            categories: vec![(1, "Servers")],
            products: HashMap::from([(1, vec![(101, "false")])]),
            prices: HashMap::from([(101, ("10.00", "1"))]),
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(source, store.clone()).with_clock(fixed_clock);
        orch.run_full_sync().await.unwrap();
        orch.run_price_refresh().await.unwrap();

        let view = store.read_catalog_view().await.unwrap();
        let price = view.categories[0].products[0].price.clone().unwrap();
        assert_eq!(price.updated_at, fixed_clock());
    }

    #[tokio::test]
    async fn fixture_source_syncs_end_to_end() {
        use crate::vendor::fixture::FixtureSource;

        let store = Arc::new(MemoryStore::new());
        let orch = SyncOrchestrator::new(
            Arc::new(FixtureSource::default()),
            store.clone(),
            "demo",
        );

        let report = orch.run_full_sync().await.unwrap();
        assert_eq!(report.categories, 3);
        assert_eq!(report.products, 4);
        assert_eq!(report.images, 4);

        let prices = orch.run_price_refresh().await.unwrap();
        assert_eq!(prices.refreshed, 4);

        let summaries = store.product_summaries(10).await.unwrap();
        assert_eq!(summaries.len(), 4);
        assert!(summaries.iter().all(|s| s.price.is_some()));
        assert_eq!(summaries[0].category_name, "Servers");
    }
}
