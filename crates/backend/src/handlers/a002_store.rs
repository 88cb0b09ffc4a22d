use axum::{
    extract::{Path, Query},
    Json,
};
use serde_json::json;

use contracts::domain::a002_store::{Store, StoreDto};
use contracts::shared::{ListParams, PagedResponse};

use crate::domain::a002_store;

/// GET /api/stores
pub async fn list_paginated(
    Query(params): Query<ListParams>,
) -> Result<Json<PagedResponse<Store>>, axum::http::StatusCode> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);

    match a002_store::service::list_paginated(page, limit).await {
        Ok((items, total)) => Ok(Json(PagedResponse::new(items, total, page, limit))),
        Err(e) => {
            tracing::error!("Failed to list stores: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/stores/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Store>, axum::http::StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(axum::http::StatusCode::BAD_REQUEST),
    };
    match a002_store::service::get_by_id(uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(axum::http::StatusCode::NOT_FOUND),
        Err(_) => Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/stores
pub async fn upsert(
    Json(dto): Json<StoreDto>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    let result = if let Some(id) = dto.id.clone() {
        a002_store::service::update(dto).await.map(|_| id)
    } else {
        a002_store::service::create(dto).await.map(|id| id.to_string())
    };
    match result {
        Ok(id) => Ok(Json(json!({"id": id}))),
        Err(e) => {
            tracing::error!("Failed to upsert store: {}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::initialize_database;

    // Ответ upsert при обновлении содержит ID самого магазина
    #[tokio::test]
    async fn test_upsert_echoes_store_id_on_update() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        initialize_database(db_path.to_str()).await.unwrap();

        let created = upsert(Json(StoreDto {
            name: "Магазин на Тверской".into(),
            ..Default::default()
        }))
        .await
        .unwrap();
        let id = created.0["id"].as_str().unwrap().to_string();
        assert_ne!(id, uuid::Uuid::nil().to_string());

        let updated = upsert(Json(StoreDto {
            id: Some(id.clone()),
            name: "Магазин на Тверской, 7".into(),
            ..Default::default()
        }))
        .await
        .unwrap();
        assert_eq!(updated.0["id"].as_str(), Some(id.as_str()));
    }
}
