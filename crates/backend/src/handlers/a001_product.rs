use axum::{
    extract::{Path, Query},
    Json,
};
use serde_json::json;

use contracts::domain::a001_product::{Product, ProductDto};
use contracts::shared::{ListParams, PagedResponse};

use crate::domain::a001_product;

/// GET /api/products
///
/// `search` фильтрует подстрокой по наименованию и артикулу; этим же
/// запросом пользуется клиент импорта как пробой существования SKU,
/// отбирая из страницы точное совпадение артикула без учета регистра.
pub async fn list_paginated(
    Query(params): Query<ListParams>,
) -> Result<Json<PagedResponse<Product>>, axum::http::StatusCode> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(50).clamp(1, 1000);

    match a001_product::service::list_paginated(page, limit, params.search.as_deref()).await {
        Ok((items, total)) => Ok(Json(PagedResponse::new(items, total, page, limit))),
        Err(e) => {
            tracing::error!("Failed to list products: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/products/:id
pub async fn get_by_id(
    Path(id): Path<String>,
) -> Result<Json<Product>, axum::http::StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(axum::http::StatusCode::BAD_REQUEST),
    };
    match a001_product::service::get_by_id(uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(axum::http::StatusCode::NOT_FOUND),
        Err(_) => Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/products
pub async fn create(
    Json(dto): Json<ProductDto>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    match a001_product::service::create(dto).await {
        Ok(id) => Ok(Json(json!({"id": id.to_string()}))),
        Err(e) => {
            tracing::error!("Failed to create product: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PUT /api/products/:id
pub async fn update(
    Path(id): Path<String>,
    Json(mut dto): Json<ProductDto>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    if uuid::Uuid::parse_str(&id).is_err() {
        return Err(axum::http::StatusCode::BAD_REQUEST);
    }
    dto.id = Some(id.clone());
    match a001_product::service::update(dto).await {
        Ok(()) => Ok(Json(json!({"id": id}))),
        Err(e) => {
            tracing::error!("Failed to update product: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/products/:id
pub async fn delete(Path(id): Path<String>) -> Result<(), axum::http::StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(axum::http::StatusCode::BAD_REQUEST),
    };
    match a001_product::service::delete(uuid).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(axum::http::StatusCode::NOT_FOUND),
        Err(_) => Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    }
}
