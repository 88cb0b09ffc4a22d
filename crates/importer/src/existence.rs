use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::grid::{display_row_number, RawGrid};
use crate::mapper::{ColumnMapping, TargetField};
use crate::validator::{RowIssue, ValidationReport};

/// Результат проверки артикула в каталоге магазина. Сетевой сбой —
/// отдельное состояние: он не доказывает ни наличие, ни отсутствие.
#[derive(Debug, Clone, PartialEq)]
pub enum SkuPresence {
    Exists,
    Absent,
    Unknown(String),
}

/// Источник проверки существования артикулов. В бою — REST-клиент
/// backend'а, в тестах — заглушка на HashMap.
#[async_trait]
pub trait CatalogProbe: Send + Sync {
    async fn sku_exists(&self, sku: &str) -> SkuPresence;
}

/// Проверка строк файла против каталога магазина. Каждый уникальный
/// артикул (без регистра, с обрезкой) запрашивается один раз, запросы
/// уходят параллельно. Найденный в каталоге артикул — ошибка для всех
/// его строк, недоступность каталога — предупреждение.
pub async fn check_catalog(
    grid: &RawGrid,
    mapping: &ColumnMapping,
    probe: Arc<dyn CatalogProbe>,
    report: &mut ValidationReport,
) {
    let Some(sku_col) = mapping.column_of(TargetField::Sku) else {
        return;
    };

    // Нормализованный артикул -> (первое написание, номера строк)
    let mut by_sku: BTreeMap<String, (String, Vec<usize>)> = BTreeMap::new();
    for index in 0..grid.total_rows() {
        let sku = grid.cell(index, sku_col).trim();
        if sku.is_empty() {
            continue;
        }
        let entry = by_sku
            .entry(sku.to_lowercase())
            .or_insert_with(|| (sku.to_string(), Vec::new()));
        entry.1.push(display_row_number(index));
    }

    tracing::info!("Проверка {} артикулов в каталоге", by_sku.len());

    let mut tasks = JoinSet::new();
    for (_, (value, rows)) in by_sku {
        let probe = Arc::clone(&probe);
        tasks.spawn(async move {
            let presence = probe.sku_exists(&value).await;
            (value, rows, presence)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let Ok((value, rows, presence)) = joined else {
            continue;
        };
        match presence {
            SkuPresence::Absent => {}
            SkuPresence::Exists => {
                for row in &rows {
                    report.errors.push(RowIssue {
                        row: *row,
                        column: "sku".to_string(),
                        message: format!("Артикул «{}» уже существует в каталоге", value),
                        value: Some(value.clone()),
                    });
                }
            }
            SkuPresence::Unknown(reason) => {
                tracing::warn!("Не удалось проверить артикул '{}': {}", value, reason);
                for row in &rows {
                    report.warnings.push(RowIssue {
                        row: *row,
                        column: "sku".to_string(),
                        message: format!(
                            "Не удалось проверить артикул «{}» в каталоге: {}",
                            value, reason
                        ),
                        value: Some(value.clone()),
                    });
                }
            }
        }
    }

    report.errors.sort_by_key(|e| e.row);
    report.warnings.sort_by_key(|w| w.row);
    report.recompute_valid_rows();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::auto_map;
    use crate::validator::validate;
    use std::sync::Mutex;

    struct FakeProbe {
        existing: Vec<&'static str>,
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CatalogProbe for FakeProbe {
        async fn sku_exists(&self, sku: &str) -> SkuPresence {
            self.calls.lock().unwrap().push(sku.to_string());
            let lower = sku.to_lowercase();
            if self.failing.iter().any(|s| s.to_lowercase() == lower) {
                SkuPresence::Unknown("timeout".to_string())
            } else if self.existing.iter().any(|s| s.to_lowercase() == lower) {
                SkuPresence::Exists
            } else {
                SkuPresence::Absent
            }
        }
    }

    fn grid(rows: &[&[&str]]) -> RawGrid {
        RawGrid {
            headers: vec![
                "Название".to_string(),
                "Артикул".to_string(),
                "Цена".to_string(),
            ],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_existing_sku_becomes_error() {
        let g = grid(&[&["Кружка", "MUG-01", "10"], &["Тарелка", "PLT-01", "20"]]);
        let mapping = auto_map(&g.headers);
        let mut report = validate(&g, &mapping);
        assert!(report.commit_allowed());

        let probe = Arc::new(FakeProbe {
            existing: vec!["mug-01"],
            failing: vec![],
            calls: Mutex::new(Vec::new()),
        });
        check_catalog(&g, &mapping, probe, &mut report).await;

        assert!(!report.commit_allowed());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(report.valid_rows, 1);
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_warning_not_error() {
        let g = grid(&[&["Кружка", "MUG-01", "10"]]);
        let mapping = auto_map(&g.headers);
        let mut report = validate(&g, &mapping);

        let probe = Arc::new(FakeProbe {
            existing: vec![],
            failing: vec!["MUG-01"],
            calls: Mutex::new(Vec::new()),
        });
        check_catalog(&g, &mapping, probe, &mut report).await;

        assert!(report.commit_allowed());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.valid_rows, 1);
    }

    #[tokio::test]
    async fn test_repeated_skus_probed_once() {
        let g = grid(&[
            &["Кружка", "MUG-01", "10"],
            &["Кружка белая", "mug-01", "12"],
        ]);
        let mapping = auto_map(&g.headers);
        let mut report = ValidationReport {
            total_rows: g.total_rows(),
            ..Default::default()
        };

        let probe = Arc::new(FakeProbe {
            existing: vec![],
            failing: vec![],
            calls: Mutex::new(Vec::new()),
        });
        check_catalog(&g, &mapping, Arc::clone(&probe) as Arc<dyn CatalogProbe>, &mut report)
            .await;

        assert_eq!(probe.calls.lock().unwrap().len(), 1);
    }
}
