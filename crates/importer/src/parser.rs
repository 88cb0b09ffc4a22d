use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};
use thiserror::Error;

use crate::grid::RawGrid;

/// Ошибки разбора входного файла. Любая из них прерывает мастер
/// импорта на первом шаге.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Файл пуст или не содержит строки заголовков")]
    EmptyFile,

    #[error("Не удалось разобрать CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Не удалось прочитать книгу: {0}")]
    Workbook(String),

    #[error("Неподдерживаемый формат файла: {0}")]
    UnsupportedFormat(String),

    #[error("Ошибка чтения файла: {0}")]
    Io(#[from] std::io::Error),
}

/// Разбор CSV-текста. Пустые строки отбрасываются, ячейки обрезаются
/// по пробелам; значения в кавычках с запятыми остаются одной ячейкой.
pub fn parse_csv(text: &str) -> Result<RawGrid, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        records.push(cells);
    }

    grid_from_records(records)
}

/// Разбор бинарной книги (xlsx/xls/xlsm) из памяти.
/// Берется первый лист; все ячейки приводятся к строкам.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<RawGrid, ImportError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Workbook("В книге нет листов".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let mut records: Vec<Vec<String>> = Vec::new();
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        records.push(cells);
    }

    grid_from_records(records)
}

/// Разбор файла с диспетчеризацией по расширению.
pub fn parse_file(path: &Path) -> Result<RawGrid, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let text = std::fs::read_to_string(path)?;
            parse_csv(&text)
        }
        "xlsx" | "xls" | "xlsm" => {
            let bytes = std::fs::read(path)?;
            parse_spreadsheet(&bytes)
        }
        other => Err(ImportError::UnsupportedFormat(other.to_string())),
    }
}

fn grid_from_records(mut records: Vec<Vec<String>>) -> Result<RawGrid, ImportError> {
    if records.is_empty() {
        return Err(ImportError::EmptyFile);
    }
    let headers = records.remove(0);
    Ok(RawGrid {
        headers,
        rows: records,
    })
}

/// Приведение ячейки calamine к строке. Целые числа без хвостового ".0".
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) => String::new(),
    }
}
