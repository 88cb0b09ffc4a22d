use super::repository;
use contracts::domain::a002_store::{Store, StoreDto};
use uuid::Uuid;

pub async fn create(dto: StoreDto) -> anyhow::Result<Uuid> {
    let code = dto
        .code
        .clone()
        .unwrap_or_else(|| format!("STR-{}", Uuid::new_v4()));
    let mut aggregate = Store::new_for_insert(code, dto.name, dto.address);
    aggregate.base.comment = dto.comment;
    if let Some(is_active) = dto.is_active {
        aggregate.is_active = is_active;
    }

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(&aggregate).await
}

pub async fn update(dto: StoreDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Not found"))?;

    aggregate.base.description = dto.name;
    aggregate.base.comment = dto.comment;
    aggregate.address = dto.address;
    if let Some(is_active) = dto.is_active {
        aggregate.is_active = is_active;
    }

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::update(&aggregate).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Store>> {
    repository::get_by_id(id).await
}

pub async fn list_paginated(page: u64, limit: u64) -> anyhow::Result<(Vec<Store>, u64)> {
    repository::list_paginated(page, limit).await
}
