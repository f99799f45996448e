// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Dashboard + health
        .route("/", web::get().to(handlers::dashboard))
        .route("/health", web::get().to(handlers::health_check))
        // JSON API
        .service(
            web::scope("/api/v1")
                .route("/catalog", web::get().to(handlers::catalog_tree))
                .route("/products", web::get().to(handlers::list_products))
                .route("/sync/run", web::post().to(handlers::run_sync))
                .route("/prices/refresh", web::post().to(handlers::refresh_prices)),
        );
}
