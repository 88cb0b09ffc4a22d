use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::domain::a001_product::ProductDto;
use contracts::domain::a003_import_run::{ImportRunItem, ImportRunStatus};

use crate::grid::{display_row_number, RawGrid};
use crate::mapper::{ColumnMapping, TargetField};
use crate::validator::{parse_price, RowIssue};

/// Запись строк в каталог. В бою — REST-клиент backend'а,
/// в тестах — заглушка.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Создать товар; возвращает ID созданной записи
    async fn create_product(&self, dto: &ProductDto) -> anyhow::Result<String>;
}

/// Токен отмены коммита. Клонируется в обработчик Ctrl+C;
/// уже записанные строки не откатываются.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct CommitOptions {
    /// Пауза между строками, чтобы не зажимать backend
    pub row_delay: Duration,
    pub store_id: Option<String>,
    pub cancel: CancelToken,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            row_delay: Duration::from_millis(100),
            store_id: None,
            cancel: CancelToken::new(),
        }
    }
}

/// Прогресс после очередной строки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommitProgress {
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

impl CommitProgress {
    fn new(done: usize, total: usize) -> Self {
        let percent = ((done as f64 / total.max(1) as f64) * 100.0).round() as u8;
        Self {
            done,
            total,
            percent,
        }
    }
}

/// Итог коммита. `success_rows + error_rows` равно числу строк,
/// которые успели обработаться до отмены.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub total_rows: usize,
    pub success_rows: usize,
    pub error_rows: usize,
    pub cancelled: bool,
    /// Снимок успешно созданных строк для журнала импорта
    pub items: Vec<ImportRunItem>,
    /// Ошибки записи по строкам
    pub row_errors: Vec<RowIssue>,
}

impl CommitOutcome {
    /// Статус для журнала: прерванный прогон записывается как failed.
    /// Ошибки отдельных строк статус не меняют — они видны в счетчиках.
    pub fn status(&self) -> ImportRunStatus {
        if self.cancelled {
            ImportRunStatus::Failed
        } else {
            ImportRunStatus::Completed
        }
    }
}

/// Сборка DTO товара из строки таблицы по текущему сопоставлению
fn row_to_dto(
    grid: &RawGrid,
    mapping: &ColumnMapping,
    index: usize,
    store_id: &Option<String>,
) -> ProductDto {
    let cell = |target: TargetField| -> String {
        mapping
            .column_of(target)
            .map(|col| grid.cell(index, col).trim().to_string())
            .unwrap_or_default()
    };

    let price = parse_price(&cell(TargetField::Price));
    let stock = cell(TargetField::Stock).parse::<i64>().ok();

    ProductDto {
        id: None,
        code: None,
        name: cell(TargetField::Name),
        sku: cell(TargetField::Sku),
        price,
        stock,
        unit: None,
        barcode: None,
        store_id: store_id.clone(),
        comment: None,
    }
}

/// Последовательная запись строк файла в каталог. Строки пишутся
/// строго по одной; ошибка строки не останавливает прогон, отмена —
/// останавливает перед следующей строкой.
pub async fn run_commit<W, F>(
    grid: &RawGrid,
    mapping: &ColumnMapping,
    writer: &W,
    options: &CommitOptions,
    mut on_progress: F,
) -> CommitOutcome
where
    W: CatalogWriter + ?Sized,
    F: FnMut(CommitProgress),
{
    let total_rows = grid.total_rows();
    let mut outcome = CommitOutcome {
        total_rows,
        success_rows: 0,
        error_rows: 0,
        cancelled: false,
        items: Vec::new(),
        row_errors: Vec::new(),
    };

    tracing::info!("Начало записи: {} строк", total_rows);

    for index in 0..total_rows {
        if options.cancel.is_cancelled() {
            outcome.cancelled = true;
            tracing::warn!(
                "Запись прервана на строке {} из {}",
                index,
                total_rows
            );
            break;
        }

        let row_no = display_row_number(index);
        let dto = row_to_dto(grid, mapping, index, &options.store_id);

        match writer.create_product(&dto).await {
            Ok(product_id) => {
                outcome.success_rows += 1;
                outcome.items.push(ImportRunItem {
                    product_id: Some(product_id),
                    product_name: dto.name.clone(),
                    product_sku: dto.sku.clone(),
                    barcode: None,
                    quantity: dto.stock.unwrap_or(0) as f64,
                    unit: "шт".to_string(),
                });
            }
            Err(e) => {
                outcome.error_rows += 1;
                tracing::warn!("Строка {}: ошибка записи: {}", row_no, e);
                outcome.row_errors.push(RowIssue {
                    row: row_no,
                    column: "commit".to_string(),
                    message: format!("Ошибка записи: {}", e),
                    value: Some(dto.sku.clone()),
                });
            }
        }

        on_progress(CommitProgress::new(index + 1, total_rows));

        if index + 1 < total_rows && !options.row_delay.is_zero() {
            tokio::time::sleep(options.row_delay).await;
        }
    }

    tracing::info!(
        "Запись завершена: успешно {}, с ошибками {}, отменено: {}",
        outcome.success_rows,
        outcome.error_rows,
        outcome.cancelled
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::auto_map;
    use std::sync::Mutex;

    struct FakeWriter {
        fail_skus: Vec<&'static str>,
        created: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CatalogWriter for FakeWriter {
        async fn create_product(&self, dto: &ProductDto) -> anyhow::Result<String> {
            if self.fail_skus.contains(&dto.sku.as_str()) {
                anyhow::bail!("duplicate sku");
            }
            self.created.lock().unwrap().push(dto.sku.clone());
            Ok(format!("id-{}", dto.sku))
        }
    }

    fn grid(rows: &[&[&str]]) -> RawGrid {
        RawGrid {
            headers: vec![
                "Название".to_string(),
                "Артикул".to_string(),
                "Цена".to_string(),
                "Остаток".to_string(),
            ],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn options() -> CommitOptions {
        CommitOptions {
            row_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_commit_writes_rows_in_order() {
        let g = grid(&[
            &["Кружка", "A1", "10", "2"],
            &["Тарелка", "A2", "20", "3"],
            &["Ложка", "A3", "30", "4"],
        ]);
        let mapping = auto_map(&g.headers);
        let writer = FakeWriter {
            fail_skus: vec![],
            created: Mutex::new(Vec::new()),
        };

        let mut percents = Vec::new();
        let outcome = run_commit(&g, &mapping, &writer, &options(), |p| {
            percents.push(p.percent);
        })
        .await;

        assert_eq!(outcome.success_rows, 3);
        assert_eq!(outcome.error_rows, 0);
        assert_eq!(outcome.status(), ImportRunStatus::Completed);
        assert_eq!(*writer.created.lock().unwrap(), vec!["A1", "A2", "A3"]);
        assert_eq!(percents, vec![33, 67, 100]);
        // снимок для журнала собран из успешных строк
        assert_eq!(outcome.items.len(), 3);
        assert_eq!(outcome.items[0].quantity, 2.0);
    }

    #[tokio::test]
    async fn test_row_error_does_not_stop_commit() {
        let g = grid(&[
            &["Кружка", "A1", "10", "1"],
            &["Тарелка", "BAD", "20", "1"],
            &["Ложка", "A3", "30", "1"],
        ]);
        let mapping = auto_map(&g.headers);
        let writer = FakeWriter {
            fail_skus: vec!["BAD"],
            created: Mutex::new(Vec::new()),
        };

        let outcome = run_commit(&g, &mapping, &writer, &options(), |_| {}).await;

        assert_eq!(outcome.success_rows, 2);
        assert_eq!(outcome.error_rows, 1);
        assert_eq!(outcome.success_rows + outcome.error_rows, outcome.total_rows);
        assert_eq!(outcome.row_errors.len(), 1);
        assert_eq!(outcome.row_errors[0].row, 3);
        // ошибки строк отражаются в счетчиках, но прогон завершен
        assert_eq!(outcome.status(), ImportRunStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_row() {
        let g = grid(&[
            &["Кружка", "A1", "10", "1"],
            &["Тарелка", "A2", "20", "1"],
            &["Ложка", "A3", "30", "1"],
        ]);
        let mapping = auto_map(&g.headers);
        let writer = FakeWriter {
            fail_skus: vec![],
            created: Mutex::new(Vec::new()),
        };

        let opts = options();
        let cancel = opts.cancel.clone();
        let outcome = run_commit(&g, &mapping, &writer, &opts, |p| {
            if p.done == 1 {
                cancel.cancel();
            }
        })
        .await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.success_rows, 1);
        // уже записанные строки не откатываются
        assert_eq!(writer.created.lock().unwrap().len(), 1);
        assert_eq!(outcome.status(), ImportRunStatus::Failed);
    }

    #[tokio::test]
    async fn test_progress_on_empty_grid() {
        let g = grid(&[]);
        let mapping = auto_map(&g.headers);
        let writer = FakeWriter {
            fail_skus: vec![],
            created: Mutex::new(Vec::new()),
        };

        let outcome = run_commit(&g, &mapping, &writer, &options(), |_| {}).await;
        assert_eq!(outcome.total_rows, 0);
        assert_eq!(outcome.status(), ImportRunStatus::Completed);
        // знаменатель прогресса не делит на ноль
        assert_eq!(CommitProgress::new(0, 0).percent, 0);
    }
}
