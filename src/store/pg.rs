//! Postgres-backed catalog store. One statement per row; a sync run is
//! intentionally not wrapped in a single transaction — partial visibility of
//! an in-progress run is accepted, and upsert idempotence keeps concurrent
//! writers safe.

use crate::catalog::{
    CatalogView, Category, CategoryNode, PriceQuote, PriceRow, Product, ProductNode,
    ProductSummary,
};
use crate::error::SyncError;
use crate::store::CatalogStore;
use crate::util::db::Db;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::collections::HashMap;

#[derive(Clone)]
pub struct PgCatalogStore {
    db: Db,
}

impl PgCatalogStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn upsert_categories(&self, rows: &[Category]) -> Result<(), SyncError> {
        for row in rows {
            sqlx::query(
                "INSERT INTO categories (id, name, parent_id)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (id) DO UPDATE
                   SET name = EXCLUDED.name,
                       parent_id = EXCLUDED.parent_id",
            )
            .bind(row.id)
            .bind(&row.name)
            .bind(row.parent_id)
            .execute(&self.db.pool)
            .await?;
        }
        Ok(())
    }

    async fn upsert_products(&self, rows: &[Product]) -> Result<(), SyncError> {
        for row in rows {
            sqlx::query(
                "INSERT INTO products (id, category_id, is_deleted, name, vendor)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO UPDATE
                   SET category_id = EXCLUDED.category_id,
                       is_deleted = EXCLUDED.is_deleted,
                       name = COALESCE(EXCLUDED.name, products.name),
                       vendor = COALESCE(EXCLUDED.vendor, products.vendor)",
            )
            .bind(row.id)
            .bind(row.category_id)
            .bind(row.is_deleted)
            .bind(&row.name)
            .bind(&row.vendor)
            .execute(&self.db.pool)
            .await?;
        }
        Ok(())
    }

    async fn upsert_price(
        &self,
        goods_id: i64,
        quote: &PriceQuote,
        now: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        sqlx::query(
            "INSERT INTO prices (goods_id, price, quantity, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (goods_id) DO UPDATE
               SET price = EXCLUDED.price,
                   quantity = EXCLUDED.quantity,
                   updated_at = EXCLUDED.updated_at",
        )
        .bind(goods_id)
        .bind(&quote.price)
        .bind(quote.quantity)
        .bind(now)
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }

    async fn append_image(&self, goods_id: i64, url: &str) -> Result<(), SyncError> {
        sqlx::query(
            "INSERT INTO product_images (goods_id, url)
             VALUES ($1, $2)
             ON CONFLICT (goods_id, url) DO NOTHING",
        )
        .bind(goods_id)
        .bind(url)
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }

    async fn list_active_product_ids(&self) -> Result<Vec<i64>, SyncError> {
        let rows = sqlx::query("SELECT id FROM products WHERE NOT is_deleted ORDER BY id")
            .fetch_all(&self.db.pool)
            .await?;
        let mut ids = Vec::with_capacity(rows.len());
        for r in rows {
            ids.push(r.try_get::<i64, _>("id")?);
        }
        Ok(ids)
    }

    async fn read_catalog_view(&self) -> Result<CatalogView, SyncError> {
        let cat_rows = sqlx::query("SELECT id, name, parent_id FROM categories ORDER BY id")
            .fetch_all(&self.db.pool)
            .await?;
        let prod_rows = sqlx::query(
            "SELECT id, category_id, is_deleted, name, vendor FROM products ORDER BY id",
        )
        .fetch_all(&self.db.pool)
        .await?;
        let price_rows =
            sqlx::query("SELECT goods_id, price, quantity, updated_at FROM prices")
                .fetch_all(&self.db.pool)
                .await?;
        let image_rows =
            sqlx::query("SELECT goods_id, url FROM product_images ORDER BY id")
                .fetch_all(&self.db.pool)
                .await?;

        let mut prices: HashMap<i64, PriceRow> = HashMap::new();
        for r in price_rows {
            let goods_id = r.try_get::<i64, _>("goods_id")?;
            prices.insert(
                goods_id,
                PriceRow {
                    goods_id,
                    price: r.try_get::<Option<BigDecimal>, _>("price")?,
                    quantity: r.try_get::<Option<i32>, _>("quantity")?,
                    updated_at: r.try_get::<DateTime<Utc>, _>("updated_at")?,
                },
            );
        }

        let mut images: HashMap<i64, Vec<String>> = HashMap::new();
        for r in image_rows {
            images
                .entry(r.try_get::<i64, _>("goods_id")?)
                .or_default()
                .push(r.try_get::<String, _>("url")?);
        }

        let mut by_category: HashMap<i64, Vec<ProductNode>> = HashMap::new();
        for r in prod_rows {
            let product = Product {
                id: r.try_get("id")?,
                category_id: r.try_get("category_id")?,
                is_deleted: r.try_get("is_deleted")?,
                name: r.try_get("name")?,
                vendor: r.try_get("vendor")?,
            };
            let node = ProductNode {
                price: prices.get(&product.id).cloned(),
                images: images.remove(&product.id).unwrap_or_default(),
                product,
            };
            by_category
                .entry(node.product.category_id)
                .or_default()
                .push(node);
        }

        let mut categories = Vec::with_capacity(cat_rows.len());
        for r in cat_rows {
            let category = Category {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
                parent_id: r.try_get("parent_id")?,
            };
            categories.push(CategoryNode {
                products: by_category.remove(&category.id).unwrap_or_default(),
                category,
            });
        }

        Ok(CatalogView { categories })
    }

    async fn product_summaries(&self, limit: i64) -> Result<Vec<ProductSummary>, SyncError> {
        let rows = sqlx::query(
            "SELECT p.id, p.name, p.vendor, p.category_id, c.name AS category_name,
                    pr.price, pr.quantity
             FROM products p
             JOIN categories c ON c.id = p.category_id
             LEFT JOIN prices pr ON pr.goods_id = p.id
             WHERE NOT p.is_deleted
             ORDER BY p.id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.db.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(ProductSummary {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
                vendor: r.try_get("vendor")?,
                category_id: r.try_get("category_id")?,
                category_name: r.try_get("category_name")?,
                price: r.try_get::<Option<BigDecimal>, _>("price")?,
                quantity: r.try_get::<Option<i32>, _>("quantity")?,
            });
        }
        Ok(out)
    }
}
