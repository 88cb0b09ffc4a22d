use axum::{routing::get, Router};

use crate::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // A001 Product handlers
        .route(
            "/api/products",
            get(handlers::a001_product::list_paginated).post(handlers::a001_product::create),
        )
        .route(
            "/api/products/:id",
            get(handlers::a001_product::get_by_id)
                .put(handlers::a001_product::update)
                .delete(handlers::a001_product::delete),
        )
        // A002 Store handlers
        .route(
            "/api/stores",
            get(handlers::a002_store::list_paginated).post(handlers::a002_store::upsert),
        )
        .route("/api/stores/:id", get(handlers::a002_store::get_by_id))
        // A003 Import history handlers
        .route(
            "/api/import-history/products",
            get(handlers::a003_import_run::list_paginated)
                .post(handlers::a003_import_run::create),
        )
        .route(
            "/api/import-history/products/:id",
            get(handlers::a003_import_run::get_by_id),
        )
}
