use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Колонки шаблона импорта. Первые четыре распознаются
/// автосопоставлением, остальные заполняются по желанию.
pub const TEMPLATE_HEADERS: [&str; 13] = [
    "Название",
    "Артикул",
    "Цена",
    "Остаток",
    "Единица",
    "Штрихкод",
    "Описание",
    "Ширина (мм)",
    "Высота (мм)",
    "Длина (мм)",
    "Вес (г)",
    "Изображения",
    "Комментарий",
];

/// Примеры строк, чтобы формат был понятен без документации
const SAMPLE_ROWS: [[&str; 13]; 2] = [
    [
        "Кружка керамическая",
        "MUG-001",
        "350",
        "120",
        "шт",
        "4600000000017",
        "Кружка 330 мл, белая",
        "95",
        "100",
        "95",
        "310",
        "",
        "",
    ],
    [
        "Тарелка обеденная",
        "PLT-001",
        "290",
        "80",
        "шт",
        "4600000000024",
        "Тарелка 24 см",
        "240",
        "25",
        "240",
        "420",
        "",
        "",
    ],
];

fn quote_csv(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Шаблон в виде CSV-текста
pub fn template_csv() -> String {
    let mut lines = Vec::with_capacity(1 + SAMPLE_ROWS.len());
    lines.push(
        TEMPLATE_HEADERS
            .iter()
            .map(|h| quote_csv(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in SAMPLE_ROWS {
        lines.push(row.iter().map(|c| quote_csv(c)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n") + "\n"
}

/// Запись шаблона в книгу xlsx
pub fn write_template_xlsx(path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in TEMPLATE_HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .context("Не удалось записать заголовок шаблона")?;
    }
    for (row, cells) in SAMPLE_ROWS.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            worksheet
                .write_string((row + 1) as u32, col as u16, *cell)
                .context("Не удалось записать строку шаблона")?;
        }
    }

    workbook
        .save(path)
        .context("Не удалось сохранить файл шаблона")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{auto_map, TargetField};
    use crate::parser::parse_csv;

    #[test]
    fn test_template_csv_shape() {
        let grid = parse_csv(&template_csv()).unwrap();
        assert_eq!(grid.headers.len(), 13);
        assert_eq!(grid.rows.len(), 2);
    }

    #[test]
    fn test_template_headers_auto_map() {
        let grid = parse_csv(&template_csv()).unwrap();
        let mapping = auto_map(&grid.headers);
        assert_eq!(mapping.column_of(TargetField::Name), Some(0));
        assert_eq!(mapping.column_of(TargetField::Sku), Some(1));
        assert_eq!(mapping.column_of(TargetField::Price), Some(2));
        assert_eq!(mapping.column_of(TargetField::Stock), Some(3));
    }

    #[test]
    fn test_template_xlsx_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");
        write_template_xlsx(&path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
