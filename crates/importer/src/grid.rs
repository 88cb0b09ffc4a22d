use serde::{Deserialize, Serialize};

/// Прямоугольная таблица строковых ячеек: строка заголовков + данные.
/// Живет только на время работы мастера импорта.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawGrid {
    /// Ячейка данных. Короткие строки добиваются пустыми значениями:
    /// выход за границу строки читается как "".
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Номер строки для пользователя: единица за счет 1-based нумерации
/// плюс единица за строку заголовков.
pub fn display_row_number(index: usize) -> usize {
    index + 2
}

#[cfg(test)]
mod tests {
    use super::*;

    // Конвенция "+2" зафиксирована: первая строка данных показывается как 2
    #[test]
    fn test_display_row_number_offset() {
        assert_eq!(display_row_number(0), 2);
        assert_eq!(display_row_number(8), 10);
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let grid = RawGrid {
            headers: vec!["a".into(), "b".into(), "c".into()],
            rows: vec![vec!["1".into()]],
        };
        assert_eq!(grid.cell(0, 0), "1");
        assert_eq!(grid.cell(0, 2), "");
        assert_eq!(grid.cell(5, 0), "");
    }
}
