use axum::{
    extract::{Path, Query},
    Json,
};
use serde::Serialize;
use serde_json::json;

use contracts::domain::a003_import_run::{ImportRun, ImportRunDto, ImportRunItem};
use contracts::shared::{ListParams, PagedResponse};

use crate::domain::a003_import_run;

/// Детальная карточка прогона: строки снимка плюс итоги (read-only)
#[derive(Debug, Serialize)]
pub struct ImportRunDetails {
    #[serde(flatten)]
    pub run: ImportRun,
    pub items: Vec<ImportRunItem>,
    #[serde(rename = "distinctProducts")]
    pub distinct_products: usize,
    #[serde(rename = "totalQuantity")]
    pub total_quantity: f64,
}

/// GET /api/import-history/products
pub async fn list_paginated(
    Query(params): Query<ListParams>,
) -> Result<Json<PagedResponse<ImportRun>>, axum::http::StatusCode> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 500);

    match a003_import_run::service::list_paginated(page, limit, params.store_id.as_deref()).await
    {
        Ok((items, total)) => Ok(Json(PagedResponse::new(items, total, page, limit))),
        Err(e) => {
            tracing::error!("Failed to list import history: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/import-history/products/:id
pub async fn get_by_id(
    Path(id): Path<String>,
) -> Result<Json<ImportRunDetails>, axum::http::StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(axum::http::StatusCode::BAD_REQUEST),
    };
    match a003_import_run::service::get_by_id(uuid).await {
        Ok(Some(run)) => {
            let items = run.items();
            let distinct_products = run.distinct_product_names();
            let total_quantity = run.total_quantity();
            Ok(Json(ImportRunDetails {
                run,
                items,
                distinct_products,
                total_quantity,
            }))
        }
        Ok(None) => Err(axum::http::StatusCode::NOT_FOUND),
        Err(_) => Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/import-history/products
pub async fn create(
    Json(dto): Json<ImportRunDto>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    tracing::info!(
        "Persisting import run: file={}, total={}, success={}, errors={}",
        dto.file_name,
        dto.total_rows,
        dto.success_rows,
        dto.error_rows
    );
    match a003_import_run::service::create(dto).await {
        Ok(id) => Ok(Json(json!({"id": id.to_string()}))),
        Err(e) => {
            tracing::error!("Failed to persist import run: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
