//! Domain entities for the synced catalog. Ids are vendor-assigned and stable
//! across sync runs; they are the upsert keys everywhere.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// None for root categories; the vendor never signals category removal.
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    /// Vendor-reported soft-delete. Flipped in place on later syncs; rows are
    /// never physically removed.
    pub is_deleted: bool,
    pub name: Option<String>,
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub goods_id: i64,
    pub price: Option<BigDecimal>,
    pub quantity: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRow {
    pub goods_id: i64,
    pub url: String,
}

/// Normalized price/quantity quote, before a timestamp is attached at
/// persistence time. Either field may be absent independently.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Option<BigDecimal>,
    pub quantity: Option<i32>,
}

// --- presentation projections ------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogView {
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<ProductNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductNode {
    #[serde(flatten)]
    pub product: Product,
    pub price: Option<PriceRow>,
    pub images: Vec<String>,
}

/// Flat row for the JSON/table view. Active products only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub category_id: i64,
    pub category_name: String,
    pub price: Option<BigDecimal>,
    pub quantity: Option<i32>,
}

impl CatalogView {
    pub fn product_count(&self) -> usize {
        self.categories.iter().map(|c| c.products.len()).sum()
    }
}
