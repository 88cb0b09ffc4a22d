use super::repository;
use contracts::domain::a001_product::{Product, ProductDto};
use uuid::Uuid;

pub async fn create(dto: ProductDto) -> anyhow::Result<Uuid> {
    // Артикул уникален в пределах каталога (без учета регистра)
    let existing = repository::find_by_sku_ignore_case(&dto.sku).await?;
    if !existing.is_empty() {
        anyhow::bail!("Товар с артикулом '{}' уже существует", dto.sku.trim());
    }

    let code = dto
        .code
        .clone()
        .unwrap_or_else(|| format!("PRD-{}", Uuid::new_v4()));
    let mut aggregate = Product::new_for_insert(
        code,
        dto.name.clone(),
        dto.sku.trim().to_string(),
        dto.price.unwrap_or(0.0),
        dto.stock.unwrap_or(0),
        dto.store_id.clone(),
    );
    aggregate.base.comment = dto.comment.clone();
    if let Some(unit) = dto.unit {
        aggregate.unit = unit;
    }
    aggregate.barcode = dto.barcode;

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(&aggregate).await
}

pub async fn update(dto: ProductDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Not found"))?;

    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::update(&aggregate).await
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(id).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Product>> {
    repository::get_by_id(id).await
}

pub async fn list_paginated(
    page: u64,
    limit: u64,
    search: Option<&str>,
) -> anyhow::Result<(Vec<Product>, u64)> {
    repository::list_paginated(page, limit, search).await
}
