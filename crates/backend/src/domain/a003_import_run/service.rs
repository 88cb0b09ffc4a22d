use super::repository;
use contracts::domain::a003_import_run::{ImportRun, ImportRunDto};
use uuid::Uuid;

pub async fn create(dto: ImportRunDto) -> anyhow::Result<Uuid> {
    if dto.file_name.trim().is_empty() {
        anyhow::bail!("Имя файла не может быть пустым");
    }

    let mut aggregate = ImportRun::new_for_insert(
        dto.file_name,
        dto.store_id,
        dto.total_rows,
        dto.success_rows,
        dto.error_rows,
        dto.status,
        &dto.items,
    );
    aggregate.before_write();

    repository::insert(&aggregate).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<ImportRun>> {
    repository::get_by_id(id).await
}

pub async fn list_paginated(
    page: u64,
    limit: u64,
    store_id: Option<&str>,
) -> anyhow::Result<(Vec<ImportRun>, u64)> {
    repository::list_paginated(page, limit, store_id).await
}
