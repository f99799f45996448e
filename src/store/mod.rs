//! Catalog persistence: idempotent upserts keyed by the vendor-assigned id,
//! plus the point reads the dashboard and the price-refresh cycle need.
//!
//! Every upsert is safe to apply repeatedly with the same input — the same
//! category or product can appear in overlapping sync runs, and concurrent
//! writers share nothing beyond this idempotence.

pub mod memory;
pub mod pg;

use crate::catalog::{CatalogView, Category, PriceQuote, Product, ProductSummary};
use crate::error::SyncError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert-or-update by id; on conflict overwrite name and parent_id.
    async fn upsert_categories(&self, rows: &[Category]) -> Result<(), SyncError>;

    /// Insert-or-update by id; on conflict overwrite is_deleted and
    /// category_id. Name/vendor are only overwritten when the new row carries
    /// them. Existing price and image rows are left untouched.
    async fn upsert_products(&self, rows: &[Product]) -> Result<(), SyncError>;

    /// Insert-or-update by goods_id; on conflict overwrite price, quantity
    /// and the refresh timestamp.
    async fn upsert_price(
        &self,
        goods_id: i64,
        quote: &PriceQuote,
        now: DateTime<Utc>,
    ) -> Result<(), SyncError>;

    /// Insert unless the exact (goods_id, url) pair already exists.
    async fn append_image(&self, goods_id: i64, url: &str) -> Result<(), SyncError>;

    /// Ids of all products with `is_deleted = false`, in id order. Drives the
    /// price-refresh cycle.
    async fn list_active_product_ids(&self) -> Result<Vec<i64>, SyncError>;

    /// Nested Category → Product (→ Price, → Images) projection. Deleted
    /// products are included with their flag set; consumers decide whether to
    /// show them.
    async fn read_catalog_view(&self) -> Result<CatalogView, SyncError>;

    /// Flat active-product list for the JSON/table view.
    async fn product_summaries(&self, limit: i64) -> Result<Vec<ProductSummary>, SyncError>;
}
