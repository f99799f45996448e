//! In-memory catalog store. Backs fixture/demo mode (the service runs without
//! a database, like the original mock dashboard) and the orchestration tests.
//! Semantics mirror the Postgres implementation exactly.

use crate::catalog::{
    CatalogView, Category, CategoryNode, ImageRow, PriceQuote, PriceRow, Product, ProductNode,
    ProductSummary,
};
use crate::error::SyncError;
use crate::store::CatalogStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    prices: BTreeMap<i64, PriceRow>,
    images: Vec<ImageRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn upsert_categories(&self, rows: &[Category]) -> Result<(), SyncError> {
        let mut inner = self.inner.write().await;
        for row in rows {
            inner.categories.insert(row.id, row.clone());
        }
        Ok(())
    }

    async fn upsert_products(&self, rows: &[Product]) -> Result<(), SyncError> {
        let mut inner = self.inner.write().await;
        for row in rows {
            let merged = match inner.products.get(&row.id) {
                Some(existing) => Product {
                    id: row.id,
                    category_id: row.category_id,
                    is_deleted: row.is_deleted,
                    name: row.name.clone().or_else(|| existing.name.clone()),
                    vendor: row.vendor.clone().or_else(|| existing.vendor.clone()),
                },
                None => row.clone(),
            };
            inner.products.insert(row.id, merged);
        }
        Ok(())
    }

    async fn upsert_price(
        &self,
        goods_id: i64,
        quote: &PriceQuote,
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let mut inner = self.inner.write().await;
        inner.prices.insert(
            goods_id,
            PriceRow {
                goods_id,
                price: quote.price.clone(),
                quantity: quote.quantity,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn append_image(&self, goods_id: i64, url: &str) -> Result<(), SyncError> {
        let mut inner = self.inner.write().await;
        let exists = inner
            .images
            .iter()
            .any(|i| i.goods_id == goods_id && i.url == url);
        if !exists {
            inner.images.push(ImageRow {
                goods_id,
                url: url.to_string(),
            });
        }
        Ok(())
    }

    async fn list_active_product_ids(&self) -> Result<Vec<i64>, SyncError> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .filter(|p| !p.is_deleted)
            .map(|p| p.id)
            .collect())
    }

    async fn read_catalog_view(&self) -> Result<CatalogView, SyncError> {
        let inner = self.inner.read().await;
        let categories = inner
            .categories
            .values()
            .map(|category| CategoryNode {
                products: inner
                    .products
                    .values()
                    .filter(|p| p.category_id == category.id)
                    .map(|p| ProductNode {
                        product: p.clone(),
                        price: inner.prices.get(&p.id).cloned(),
                        images: inner
                            .images
                            .iter()
                            .filter(|i| i.goods_id == p.id)
                            .map(|i| i.url.clone())
                            .collect(),
                    })
                    .collect(),
                category: category.clone(),
            })
            .collect();
        Ok(CatalogView { categories })
    }

    async fn product_summaries(&self, limit: i64) -> Result<Vec<ProductSummary>, SyncError> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .filter(|p| !p.is_deleted)
            .take(limit.max(0) as usize)
            .map(|p| ProductSummary {
                id: p.id,
                name: p.name.clone(),
                vendor: p.vendor.clone(),
                category_id: p.category_id,
                category_name: inner
                    .categories
                    .get(&p.category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                price: inner.prices.get(&p.id).and_then(|pr| pr.price.clone()),
                quantity: inner.prices.get(&p.id).and_then(|pr| pr.quantity),
            })
            .collect())
    }
}
