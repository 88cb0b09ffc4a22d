use chrono::Utc;
use contracts::domain::a003_import_run::{ImportRun, ImportRunId, ImportRunStatus};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_import_run")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub file_name: String,
    pub store_id: Option<String>,
    pub total_rows: i32,
    pub success_rows: i32,
    pub error_rows: i32,
    pub status: String,
    pub items_json: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImportRun {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        // Незнакомый статус из БД трактуем как failed
        let status = ImportRunStatus::from_str(&m.status).unwrap_or(ImportRunStatus::Failed);

        ImportRun {
            base: BaseAggregate::with_metadata(
                ImportRunId::new(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            file_name: m.file_name,
            store_id: m.store_id,
            total_rows: m.total_rows,
            success_rows: m.success_rows,
            error_rows: m.error_rows,
            status,
            items_json: m.items_json,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Журнал прогонов, новые сверху. Опциональный фильтр по магазину.
pub async fn list_paginated(
    page: u64,
    limit: u64,
    store_id: Option<&str>,
) -> anyhow::Result<(Vec<ImportRun>, u64)> {
    let mut query = Entity::find().filter(Column::IsDeleted.eq(false));

    if let Some(store) = store_id.map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(Column::StoreId.eq(store));
    }

    let paginator = query
        .order_by_desc(Column::CreatedAt)
        .paginate(conn(), limit);
    let total = paginator.num_items().await?;
    let items: Vec<ImportRun> = paginator
        .fetch_page(page.saturating_sub(1))
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok((items, total))
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<ImportRun>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &ImportRun) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        file_name: Set(aggregate.file_name.clone()),
        store_id: Set(aggregate.store_id.clone()),
        total_rows: Set(aggregate.total_rows),
        success_rows: Set(aggregate.success_rows),
        error_rows: Set(aggregate.error_rows),
        status: Set(aggregate.status.as_str().to_string()),
        items_json: Set(aggregate.items_json.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}
