use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Целевое поле каталога, в которое может отображаться колонка файла.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetField {
    Name,
    Sku,
    Price,
    Stock,
}

impl TargetField {
    pub const ALL: [TargetField; 4] = [
        TargetField::Name,
        TargetField::Sku,
        TargetField::Price,
        TargetField::Stock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetField::Name => "name",
            TargetField::Sku => "sku",
            TargetField::Price => "price",
            TargetField::Stock => "stock",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "name" => Some(TargetField::Name),
            "sku" => Some(TargetField::Sku),
            "price" => Some(TargetField::Price),
            "stock" => Some(TargetField::Stock),
            _ => None,
        }
    }

    /// Человекочитаемое название поля (для сообщений валидации)
    pub fn title(&self) -> &'static str {
        match self {
            TargetField::Name => "Наименование",
            TargetField::Sku => "Артикул",
            TargetField::Price => "Цена",
            TargetField::Stock => "Остаток",
        }
    }

    /// Без name, sku или price импорт невозможен; stock опционален.
    pub fn is_required(&self) -> bool {
        !matches!(self, TargetField::Stock)
    }

    /// Ключевые слова эвристики автосопоставления (подстрока, без регистра)
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            TargetField::Name => &["назв", "name"],
            TargetField::Sku => &["артик", "sku"],
            TargetField::Price => &["цен", "price"],
            TargetField::Stock => &["остат", "stock"],
        }
    }
}

/// Результат переназначения: что было вытеснено из двунаправленной
/// структуры. Вызывающий код показывает предупреждение вместо
/// молчаливой перезаписи.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingChange {
    /// Поле, которое раньше было назначено на эту колонку
    pub displaced_target: Option<TargetField>,
    /// Колонка, которая раньше держала это поле
    pub displaced_column: Option<usize>,
}

/// Сопоставление колонок файла целевым полям. Обе стороны связи
/// хранятся явно и обновляются вместе: каждое поле — максимум одна
/// колонка, каждая колонка — максимум одно поле.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    by_target: HashMap<TargetField, usize>,
    by_column: HashMap<usize, TargetField>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Назначить колонке поле (или снять назначение через `None`).
    /// Обе стороны структуры меняются транзакционно.
    pub fn assign(&mut self, column: usize, target: Option<TargetField>) -> MappingChange {
        let mut change = MappingChange::default();

        // Снимаем прежнее поле с этой колонки
        if let Some(old_target) = self.by_column.remove(&column) {
            self.by_target.remove(&old_target);
            change.displaced_target = Some(old_target);
        }

        if let Some(target) = target {
            // Снимаем поле с колонки, которая держала его раньше
            if let Some(old_column) = self.by_target.remove(&target) {
                self.by_column.remove(&old_column);
                change.displaced_column = Some(old_column);
            }
            self.by_target.insert(target, column);
            self.by_column.insert(column, target);
        }

        change
    }

    pub fn column_of(&self, target: TargetField) -> Option<usize> {
        self.by_target.get(&target).copied()
    }

    pub fn target_of(&self, column: usize) -> Option<TargetField> {
        self.by_column.get(&column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

/// Автосопоставление заголовков. Обход слева направо; для заголовка
/// побеждает первое подошедшее поле, а при конкуренции заголовков за
/// одно поле — более правый заголовок (как в исходном мастере).
pub fn auto_map(headers: &[String]) -> ColumnMapping {
    let mut mapping = ColumnMapping::new();

    for (idx, header) in headers.iter().enumerate() {
        let lower = header.to_lowercase();
        for target in TargetField::ALL {
            if target.keywords().iter().any(|kw| lower.contains(kw)) {
                let change = mapping.assign(idx, Some(target));
                if let Some(old_column) = change.displaced_column {
                    tracing::debug!(
                        "Заголовок '{}' (колонка {}) перехватил поле '{}' у колонки {}",
                        header,
                        idx,
                        target.as_str(),
                        old_column
                    );
                }
                break;
            }
        }
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_auto_map_russian_headers() {
        let mapping = auto_map(&headers(&["Название", "Артикул", "Цена", "Остаток"]));
        assert_eq!(mapping.column_of(TargetField::Name), Some(0));
        assert_eq!(mapping.column_of(TargetField::Sku), Some(1));
        assert_eq!(mapping.column_of(TargetField::Price), Some(2));
        assert_eq!(mapping.column_of(TargetField::Stock), Some(3));
    }

    #[test]
    fn test_auto_map_english_headers_case_insensitive() {
        let mapping = auto_map(&headers(&["Product NAME", "SKU code", "Price, RUB"]));
        assert_eq!(mapping.column_of(TargetField::Name), Some(0));
        assert_eq!(mapping.column_of(TargetField::Sku), Some(1));
        assert_eq!(mapping.column_of(TargetField::Price), Some(2));
        assert_eq!(mapping.column_of(TargetField::Stock), None);
    }

    #[test]
    fn test_auto_map_rightmost_header_wins() {
        // Два заголовка претендуют на price: выигрывает правый
        let mapping = auto_map(&headers(&["Цена закупки", "Цена продажи"]));
        assert_eq!(mapping.column_of(TargetField::Price), Some(1));
        assert_eq!(mapping.target_of(0), None);
    }

    #[test]
    fn test_assign_is_bidirectional() {
        let mut mapping = ColumnMapping::new();
        mapping.assign(0, Some(TargetField::Sku));
        assert_eq!(mapping.column_of(TargetField::Sku), Some(0));
        assert_eq!(mapping.target_of(0), Some(TargetField::Sku));

        // Переназначение поля на другую колонку вытесняет старую
        let change = mapping.assign(3, Some(TargetField::Sku));
        assert_eq!(change.displaced_column, Some(0));
        assert_eq!(mapping.column_of(TargetField::Sku), Some(3));
        assert_eq!(mapping.target_of(0), None);
    }

    #[test]
    fn test_assign_none_clears_column() {
        let mut mapping = ColumnMapping::new();
        mapping.assign(2, Some(TargetField::Price));
        let change = mapping.assign(2, None);
        assert_eq!(change.displaced_target, Some(TargetField::Price));
        assert_eq!(mapping.column_of(TargetField::Price), None);
        assert!(mapping.is_empty());
    }
}
