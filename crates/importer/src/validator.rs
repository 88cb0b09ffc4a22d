use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::grid::{display_row_number, RawGrid};
use crate::mapper::{ColumnMapping, TargetField};

/// Одно замечание валидации. `row == 0` — замечание уровня
/// сопоставления колонок (`column == "mapping"`), иначе номер строки
/// в пользовательской нумерации (данные начинаются со строки 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row: usize,
    pub column: String,
    pub message: String,
    pub value: Option<String>,
}

/// Группа строк с одинаковым артикулом внутри одного файла
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub rows: Vec<usize>,
    pub field: String,
    pub value: String,
    pub message: String,
}

/// Отчет валидации. Коммит разрешен только при пустом `errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
    pub duplicates: Vec<DuplicateGroup>,
}

impl ValidationReport {
    pub fn commit_allowed(&self) -> bool {
        self.errors.is_empty()
    }

    /// `valid_rows` = всего строк минус строки с ошибками (уникальные).
    /// Замечания уровня сопоставления (row 0) строками данных не являются
    /// и на счетчик не влияют.
    pub fn recompute_valid_rows(&mut self) {
        let error_rows: HashSet<usize> =
            self.errors.iter().map(|e| e.row).filter(|r| *r >= 2).collect();
        self.valid_rows = self.total_rows.saturating_sub(error_rows.len());
    }
}

/// Разбор цены: допускается запятая как десятичный разделитель
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Остаток: только целое неотрицательное число
pub(crate) fn is_whole_number(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

/// Чистая функция валидации таблицы с заданным сопоставлением.
/// Проверка существования в каталоге выполняется отдельно
/// (см. `existence`) и дополняет этот отчет.
pub fn validate(grid: &RawGrid, mapping: &ColumnMapping) -> ValidationReport {
    let mut report = ValidationReport {
        total_rows: grid.total_rows(),
        ..Default::default()
    };

    // Обязательные поля без назначенной колонки — ошибки уровня mapping
    for target in TargetField::ALL {
        if target.is_required() && mapping.column_of(target).is_none() {
            report.errors.push(RowIssue {
                row: 0,
                column: "mapping".to_string(),
                message: format!("Не назначена колонка для поля «{}»", target.title()),
                value: None,
            });
        }
    }

    let name_col = mapping.column_of(TargetField::Name);
    let sku_col = mapping.column_of(TargetField::Sku);
    let price_col = mapping.column_of(TargetField::Price);
    let stock_col = mapping.column_of(TargetField::Stock);

    // Артикул (нормализованный) -> (первое написание, номера строк)
    let mut sku_occurrences: BTreeMap<String, (String, Vec<usize>)> = BTreeMap::new();

    for index in 0..grid.total_rows() {
        let row_no = display_row_number(index);

        if let Some(col) = name_col {
            if grid.cell(index, col).trim().is_empty() {
                report.errors.push(RowIssue {
                    row: row_no,
                    column: "name".to_string(),
                    message: "Наименование не заполнено".to_string(),
                    value: None,
                });
            }
        }

        if let Some(col) = sku_col {
            let sku = grid.cell(index, col).trim();
            if sku.is_empty() {
                report.errors.push(RowIssue {
                    row: row_no,
                    column: "sku".to_string(),
                    message: "Артикул не заполнен".to_string(),
                    value: None,
                });
            } else {
                let entry = sku_occurrences
                    .entry(sku.to_lowercase())
                    .or_insert_with(|| (sku.to_string(), Vec::new()));
                entry.1.push(row_no);
            }
        }

        if let Some(col) = price_col {
            let raw = grid.cell(index, col).trim();
            // Пустая цена допустима; ошибка только для непустого мусора
            if !raw.is_empty() {
                match parse_price(raw) {
                    Some(price) if price >= 0.0 => {}
                    _ => {
                        report.errors.push(RowIssue {
                            row: row_no,
                            column: "price".to_string(),
                            message: "Цена должна быть неотрицательным числом".to_string(),
                            value: Some(raw.to_string()),
                        });
                    }
                }
            }
        }

        if let Some(col) = stock_col {
            let raw = grid.cell(index, col).trim();
            if !raw.is_empty() && !is_whole_number(raw) {
                report.errors.push(RowIssue {
                    row: row_no,
                    column: "stock".to_string(),
                    message: "Остаток должен быть целым неотрицательным числом".to_string(),
                    value: Some(raw.to_string()),
                });
            }
        }
    }

    // Дубликаты артикулов внутри файла: одна группа + по ошибке на строку
    for (_, (value, rows)) in sku_occurrences {
        if rows.len() < 2 {
            continue;
        }
        let rows_list = rows
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        for row_no in &rows {
            report.errors.push(RowIssue {
                row: *row_no,
                column: "sku".to_string(),
                message: format!("Артикул «{}» дублируется в строках {}", value, rows_list),
                value: Some(value.clone()),
            });
        }
        report.duplicates.push(DuplicateGroup {
            rows,
            field: "sku".to_string(),
            value: value.clone(),
            message: format!("Артикул «{}» встречается несколько раз", value),
        });
    }

    report.recompute_valid_rows();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::auto_map;

    fn grid(headers: &[&str], rows: &[&[&str]]) -> RawGrid {
        RawGrid {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn standard_mapping() -> ColumnMapping {
        auto_map(&[
            "Название".to_string(),
            "Артикул".to_string(),
            "Цена".to_string(),
            "Остаток".to_string(),
        ])
    }

    #[test]
    fn test_missing_price_column_is_mapping_error() {
        let g = grid(&["Название", "Артикул"], &[&["Кружка", "MUG-01"]]);
        let mapping = auto_map(&g.headers);
        let report = validate(&g, &mapping);

        assert!(report
            .errors
            .iter()
            .any(|e| e.row == 0 && e.column == "mapping"));
        assert!(!report.commit_allowed());
    }

    #[test]
    fn test_duplicate_skus_case_insensitive() {
        let g = grid(
            &["Название", "Артикул", "Цена", "Остаток"],
            &[
                &["Кружка", "A", "10", "1"],
                &["Тарелка", "a", "20", "1"],
                &["Ложка", "B", "30", "1"],
            ],
        );
        let report = validate(&g, &standard_mapping());

        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].rows, vec![2, 3]);
        let dup_rows: Vec<usize> = report
            .errors
            .iter()
            .filter(|e| e.column == "sku")
            .map(|e| e.row)
            .collect();
        assert_eq!(dup_rows, vec![2, 3]);
        // строка с "B" чиста
        assert_eq!(report.valid_rows, 1);
    }

    #[test]
    fn test_numeric_guards() {
        let g = grid(
            &["Название", "Артикул", "Цена", "Остаток"],
            &[
                &["Кружка", "M1", "-5", "1"],
                &["Тарелка", "M2", "abc", "1"],
                &["Ложка", "M3", "10", "12.5"],
                &["Вилка", "M4", "10", "-3"],
                // пустые цена и остаток допустимы
                &["Нож", "M5", "", ""],
            ],
        );
        let report = validate(&g, &standard_mapping());

        let columns: Vec<(&str, usize)> = report
            .errors
            .iter()
            .map(|e| (e.column.as_str(), e.row))
            .collect();
        assert!(columns.contains(&("price", 2)));
        assert!(columns.contains(&("price", 3)));
        assert!(columns.contains(&("stock", 4)));
        assert!(columns.contains(&("stock", 5)));
        assert!(!columns.iter().any(|(_, row)| *row == 6));
        assert_eq!(report.valid_rows, 1);
    }

    #[test]
    fn test_comma_decimal_price_is_valid() {
        let g = grid(
            &["Название", "Артикул", "Цена", "Остаток"],
            &[&["Кружка", "M1", "149,90", "3"]],
        );
        let report = validate(&g, &standard_mapping());
        assert!(report.commit_allowed());
    }

    #[test]
    fn test_valid_rows_dedupes_error_rows() {
        // Одна строка с двумя ошибками уменьшает счетчик на единицу
        let g = grid(
            &["Название", "Артикул", "Цена", "Остаток"],
            &[
                &["", "M1", "abc", "1"],
                &["Тарелка", "M2", "20", "1"],
            ],
        );
        let report = validate(&g, &standard_mapping());

        let row2_errors = report.errors.iter().filter(|e| e.row == 2).count();
        assert_eq!(row2_errors, 2);
        assert_eq!(report.valid_rows, 1);
    }

    #[test]
    fn test_mapping_errors_do_not_consume_data_rows() {
        // Нет колонки цены, но сами строки корректны
        let g = grid(
            &["Название", "Артикул"],
            &[&["Кружка", "M1"], &["Тарелка", "M2"]],
        );
        let mapping = auto_map(&g.headers);
        let report = validate(&g, &mapping);

        assert!(!report.commit_allowed());
        assert_eq!(report.valid_rows, 2);
    }

    #[test]
    fn test_short_rows_flag_required_fields() {
        // Короткая строка: недостающие ячейки читаются как пустые
        let g = grid(
            &["Название", "Артикул", "Цена", "Остаток"],
            &[&["Кружка"]],
        );
        let report = validate(&g, &standard_mapping());
        assert!(report
            .errors
            .iter()
            .any(|e| e.row == 2 && e.column == "sku"));
    }
}
