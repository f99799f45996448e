// HTTP request handlers for the dashboard and the JSON API.
//
// The read path never surfaces a raw error page: the dashboard renders fresh
// data when a live sync succeeds, falls back to the store when it fails, and
// renders an empty catalog when the store has never been synced.

use crate::api::models::*;
use crate::api::server::AppState;
use crate::catalog::{CatalogView, ProductNode};
use crate::error::SyncError;
use actix_web::{web, HttpResponse, Result};

const DEFAULT_SUMMARY_LIMIT: i64 = 50;

fn error_status(e: &SyncError) -> HttpResponse {
    let envelope = ApiResponse::<()>::error(e.to_string());
    match e {
        SyncError::Authentication { .. } | SyncError::RemoteFetch { .. } => {
            HttpResponse::BadGateway().json(envelope)
        }
        SyncError::Persistence { .. } => HttpResponse::InternalServerError().json(envelope),
    }
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store_status = match state.store.list_active_product_ids().await {
        Ok(_) => "connected",
        Err(_) => "unavailable",
    };

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        store: store_status.to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    });
    Ok(HttpResponse::Ok().json(response))
}

/// HTML dashboard. With SYNC_ON_VIEW enabled a live full sync is attempted
/// first; on any abort the page is served from the store and labeled cached.
pub async fn dashboard(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut source_label = "cache";
    if state.sync_on_view {
        match state.orchestrator.run_full_sync().await {
            Ok(_) => source_label = "live",
            Err(e) => {
                tracing::warn!(target = "api", error = %e, "view-triggered sync failed; serving cached data");
            }
        }
    }

    match state.store.read_catalog_view().await {
        Ok(view) => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(render_dashboard(&view, source_label))),
        Err(e) => Ok(error_status(&e)),
    }
}

/// JSON catalog tree: categories with nested products, prices and images.
pub async fn catalog_tree(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.store.read_catalog_view().await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view))),
        Err(e) => Ok(error_status(&e)),
    }
}

/// Flat active-product listing for table views.
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductListQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_SUMMARY_LIMIT).clamp(1, 1000);
    match state.store.product_summaries(limit).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(ApiResponse::success(rows))),
        Err(e) => Ok(error_status(&e)),
    }
}

/// Trigger one full catalog sync and report the outcome.
pub async fn run_sync(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.orchestrator.run_full_sync().await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => {
            tracing::warn!(target = "api", error = %e, "triggered sync failed");
            Ok(error_status(&e))
        }
    }
}

/// Trigger one price-refresh cycle and report the outcome.
pub async fn refresh_prices(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.orchestrator.run_price_refresh().await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => {
            tracing::warn!(target = "api", error = %e, "triggered price refresh failed");
            Ok(error_status(&e))
        }
    }
}

// --- HTML rendering ----------------------------------------------------------

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_product_card(node: &ProductNode) -> String {
    let name = node
        .product
        .name
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| format!("#{}", node.product.id));
    let vendor = node
        .product
        .vendor
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();
    let price = node
        .price
        .as_ref()
        .and_then(|p| p.price.as_ref())
        .map(|p| format!("{p} ₽"))
        .unwrap_or_else(|| "—".to_string());
    let image = node
        .images
        .first()
        .map(|u| format!(r#"<img src="{}">"#, escape_html(u)))
        .unwrap_or_default();
    let deleted_class = if node.product.is_deleted {
        " discontinued"
    } else {
        ""
    };
    let deleted_tag = if node.product.is_deleted {
        r#"<div class="tag">discontinued</div>"#
    } else {
        ""
    };
    format!(
        r#"<div class="card{deleted_class}">{image}<div class="name">{name}</div><div class="vendor">{vendor}</div><div class="price">{price}</div>{deleted_tag}</div>"#
    )
}

fn render_dashboard(view: &CatalogView, source_label: &str) -> String {
    let mut sections = String::new();
    for cat in &view.categories {
        sections.push_str(&format!("<h2>{}</h2>\n", escape_html(&cat.category.name)));
        if cat.products.is_empty() {
            sections.push_str(r#"<div class="meta">no products</div>"#);
            continue;
        }
        sections.push_str(r#"<div class="grid">"#);
        for node in &cat.products {
            sections.push_str(&render_product_card(node));
        }
        sections.push_str("</div>\n");
    }
    if view.categories.is_empty() {
        sections.push_str(r#"<div class="meta">Catalog is empty — no sync has completed yet.</div>"#);
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Netlab Catalog</title>
<style>
body {{ font-family: Arial; background: #f4f6f8; margin: 40px; }}
h1 {{ margin-bottom: 10px; }}
.meta {{ color: #666; margin-bottom: 30px; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 20px; }}
.card {{ background: #fff; border-radius: 10px; padding: 15px; box-shadow: 0 2px 8px rgba(0,0,0,.08); }}
.card img {{ width: 100%; height: 160px; object-fit: contain; background: #fafafa; border-radius: 6px; }}
.card.discontinued {{ opacity: 0.5; }}
.name {{ font-weight: bold; margin: 10px 0 5px; }}
.vendor {{ color: #555; font-size: 14px; }}
.price {{ margin-top: 8px; font-size: 16px; color: #0a7; }}
.tag {{ margin-top: 6px; font-size: 12px; color: #a33; text-transform: uppercase; }}
</style>
</head>
<body>
<h1>Netlab Catalog</h1>
<div class="meta">data source: {source_label}</div>
{sections}
</body>
</html>"#
    )
}
