use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use contracts::domain::a003_import_run::{ImportRun, ImportRunDto};
use contracts::shared::PagedResponse;

use crate::commit::{run_commit, CancelToken, CatalogWriter, CommitOptions, CommitOutcome};
use crate::existence::{check_catalog, CatalogProbe};
use crate::mapper::{auto_map, TargetField};
use crate::parser::parse_file;
use crate::validator::{validate, ValidationReport};

/// Точка назначения импорта: проверка артикулов, запись товаров,
/// журнал прогонов. В бою — `BackofficeApiClient`.
#[async_trait]
pub trait ImportTarget: CatalogProbe + CatalogWriter {
    async fn record_run(&self, dto: &ImportRunDto) -> Result<String>;
    async fn recent_runs(&self, store_id: Option<&str>) -> Result<PagedResponse<ImportRun>>;
}

/// Параметры одного прогона мастера импорта
pub struct ImportRequest {
    pub file_path: PathBuf,
    pub store_id: Option<String>,
    /// Ручные правки автосопоставления: (колонка, поле или снятие)
    pub overrides: Vec<(usize, Option<TargetField>)>,
    pub skip_catalog_check: bool,
    pub row_delay: Duration,
    pub cancel: CancelToken,
}

impl ImportRequest {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            store_id: None,
            overrides: Vec::new(),
            skip_catalog_check: false,
            row_delay: Duration::from_millis(100),
            cancel: CancelToken::new(),
        }
    }
}

/// Итог прогона: либо отказ на валидации, либо запись с журналом
pub enum ImportResult {
    /// Коммит не выполнялся: в отчете есть ошибки
    Rejected(ValidationReport),
    Committed {
        report: ValidationReport,
        outcome: CommitOutcome,
        run_id: String,
        /// Первая страница журнала после записи
        ledger: PagedResponse<ImportRun>,
    },
}

/// Оркестратор мастера импорта: разбор файла, сопоставление,
/// валидация, проверка каталога, последовательная запись и журнал.
pub struct ImportExecutor<T: ImportTarget + 'static> {
    target: Arc<T>,
}

impl<T: ImportTarget + 'static> ImportExecutor<T> {
    pub fn new(target: Arc<T>) -> Self {
        Self { target }
    }

    pub async fn run(&self, request: ImportRequest) -> Result<ImportResult> {
        let file_name = request
            .file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("import")
            .to_string();

        tracing::info!("Импорт из файла {}", file_name);
        let grid = parse_file(&request.file_path)
            .with_context(|| format!("Не удалось разобрать файл {}", file_name))?;
        tracing::info!(
            "Разобрано: {} колонок, {} строк данных",
            grid.headers.len(),
            grid.total_rows()
        );

        let mut mapping = auto_map(&grid.headers);
        for (column, target) in &request.overrides {
            let change = mapping.assign(*column, *target);
            if let Some(displaced) = change.displaced_column {
                tracing::warn!(
                    "Колонка {} перехватила поле у колонки {}",
                    column,
                    displaced
                );
            }
        }

        let mut report = validate(&grid, &mapping);

        if !request.skip_catalog_check && report.commit_allowed() {
            check_catalog(
                &grid,
                &mapping,
                Arc::clone(&self.target) as Arc<dyn CatalogProbe>,
                &mut report,
            )
            .await;
        }

        if !report.commit_allowed() {
            tracing::warn!(
                "Импорт отклонен: {} ошибок, {} предупреждений",
                report.errors.len(),
                report.warnings.len()
            );
            return Ok(ImportResult::Rejected(report));
        }

        let commit_options = CommitOptions {
            row_delay: request.row_delay,
            store_id: request.store_id.clone(),
            cancel: request.cancel.clone(),
        };
        let mut last_percent = 0u8;
        let outcome = run_commit(&grid, &mapping, &*self.target, &commit_options, |p| {
            if p.percent != last_percent {
                last_percent = p.percent;
                tracing::info!("Прогресс записи: {}% ({}/{})", p.percent, p.done, p.total);
            }
        })
        .await;

        let dto = ImportRunDto {
            file_name,
            store_id: request.store_id.clone(),
            total_rows: outcome.total_rows as i32,
            success_rows: outcome.success_rows as i32,
            error_rows: outcome.error_rows as i32,
            status: outcome.status(),
            items: outcome.items.clone(),
        };
        let run_id = self
            .target
            .record_run(&dto)
            .await
            .context("Не удалось записать прогон в журнал")?;
        tracing::info!("Прогон записан в журнал: {}", run_id);

        let ledger = self
            .target
            .recent_runs(request.store_id.as_deref())
            .await
            .context("Не удалось перечитать журнал импорта")?;

        Ok(ImportResult::Committed {
            report,
            outcome,
            run_id,
            ledger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::existence::SkuPresence;
    use contracts::domain::a001_product::ProductDto;
    use contracts::domain::a003_import_run::ImportRunStatus;
    use std::io::Write;
    use std::sync::Mutex;

    /// Точка назначения в памяти: каталог + журнал
    #[derive(Default)]
    struct FakeTarget {
        existing_skus: Vec<&'static str>,
        created: Mutex<Vec<ProductDto>>,
        runs: Mutex<Vec<ImportRunDto>>,
    }

    #[async_trait]
    impl CatalogProbe for FakeTarget {
        async fn sku_exists(&self, sku: &str) -> SkuPresence {
            let lower = sku.to_lowercase();
            if self.existing_skus.iter().any(|s| s.to_lowercase() == lower) {
                SkuPresence::Exists
            } else {
                SkuPresence::Absent
            }
        }
    }

    #[async_trait]
    impl CatalogWriter for FakeTarget {
        async fn create_product(&self, dto: &ProductDto) -> Result<String> {
            self.created.lock().unwrap().push(dto.clone());
            Ok(format!("id-{}", dto.sku))
        }
    }

    #[async_trait]
    impl ImportTarget for FakeTarget {
        async fn record_run(&self, dto: &ImportRunDto) -> Result<String> {
            self.runs.lock().unwrap().push(dto.clone());
            Ok("run-1".to_string())
        }

        async fn recent_runs(
            &self,
            _store_id: Option<&str>,
        ) -> Result<PagedResponse<ImportRun>> {
            let runs: Vec<ImportRun> = self
                .runs
                .lock()
                .unwrap()
                .iter()
                .map(|dto| {
                    ImportRun::new_for_insert(
                        dto.file_name.clone(),
                        dto.store_id.clone(),
                        dto.total_rows,
                        dto.success_rows,
                        dto.error_rows,
                        dto.status,
                        &dto.items,
                    )
                })
                .collect();
            let total = runs.len() as u64;
            Ok(PagedResponse::new(runs, total, 1, 20))
        }
    }

    fn write_csv(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        (dir, path)
    }

    fn request(path: PathBuf) -> ImportRequest {
        ImportRequest {
            row_delay: Duration::ZERO,
            ..ImportRequest::new(path)
        }
    }

    #[tokio::test]
    async fn test_full_run_commits_and_records_ledger() {
        let (_dir, path) = write_csv(
            "Название,Артикул,Цена,Остаток\nКружка,MUG-01,350,10\nТарелка,PLT-01,290,5\n",
        );
        let target = Arc::new(FakeTarget::default());
        let executor = ImportExecutor::new(Arc::clone(&target));

        let result = executor.run(request(path)).await.unwrap();
        let ImportResult::Committed {
            outcome, ledger, ..
        } = result
        else {
            panic!("ожидался коммит");
        };

        assert_eq!(outcome.success_rows, 2);
        assert_eq!(outcome.status(), ImportRunStatus::Completed);
        assert_eq!(target.created.lock().unwrap().len(), 2);
        assert_eq!(ledger.items.len(), 1);
        assert_eq!(ledger.items[0].success_rows, 2);
    }

    #[tokio::test]
    async fn test_validation_errors_block_commit() {
        // Нет колонки цены: мастер не должен дойти до записи
        let (_dir, path) = write_csv("Название,Артикул\nКружка,MUG-01\n");
        let target = Arc::new(FakeTarget::default());
        let executor = ImportExecutor::new(Arc::clone(&target));

        let result = executor.run(request(path)).await.unwrap();
        assert!(matches!(result, ImportResult::Rejected(_)));
        assert!(target.created.lock().unwrap().is_empty());
        assert!(target.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_sku_blocks_commit() {
        let (_dir, path) =
            write_csv("Название,Артикул,Цена,Остаток\nКружка,MUG-01,350,10\n");
        let target = Arc::new(FakeTarget {
            existing_skus: vec!["mug-01"],
            ..Default::default()
        });
        let executor = ImportExecutor::new(Arc::clone(&target));

        let result = executor.run(request(path)).await.unwrap();
        let ImportResult::Rejected(report) = result else {
            panic!("ожидался отказ");
        };
        assert!(report.errors.iter().any(|e| e.row == 2));
        assert!(target.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_override_fixes_unmapped_column() {
        // Заголовок "Стоимость" не распознается автоматически
        let (_dir, path) =
            write_csv("Название,Артикул,Стоимость\nКружка,MUG-01,350\n");
        let target = Arc::new(FakeTarget::default());
        let executor = ImportExecutor::new(Arc::clone(&target));

        let mut req = request(path);
        req.overrides = vec![(2, Some(TargetField::Price))];
        let result = executor.run(req).await.unwrap();
        assert!(matches!(result, ImportResult::Committed { .. }));
    }
}
