use crate::domain::common::{AggregateId, BaseAggregate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRunId(pub Uuid);

impl ImportRunId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for ImportRunId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ImportRunId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Статус прогона импорта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportRunStatus {
    Completed,
    InProgress,
    Failed,
}

impl ImportRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportRunStatus::Completed => "completed",
            ImportRunStatus::InProgress => "in_progress",
            ImportRunStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "completed" => Ok(ImportRunStatus::Completed),
            "in_progress" => Ok(ImportRunStatus::InProgress),
            "failed" => Ok(ImportRunStatus::Failed),
            other => Err(format!("Unknown import run status: {}", other)),
        }
    }
}

/// Строка табличной части прогона — снимок того, что было импортировано.
/// Не синхронизируется с последующими правками каталога.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRunItem {
    /// ID созданного товара (None, если создание не удалось)
    #[serde(rename = "productId")]
    pub product_id: Option<String>,

    #[serde(rename = "productName")]
    pub product_name: String,

    #[serde(rename = "productSku")]
    pub product_sku: String,

    pub barcode: Option<String>,

    /// Количество (остаток на момент импорта)
    pub quantity: f64,

    /// Единица измерения
    pub unit: String,
}

/// Документ «Прогон импорта» (журнал истории импортов).
/// После записи неизменяем, кроме статуса.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    #[serde(flatten)]
    pub base: BaseAggregate<ImportRunId>,

    /// Имя загруженного файла
    #[serde(rename = "fileName")]
    pub file_name: String,

    /// Магазин, для которого выполнялся импорт
    #[serde(rename = "storeId")]
    pub store_id: Option<String>,

    #[serde(rename = "totalRows")]
    pub total_rows: i32,

    #[serde(rename = "successRows")]
    pub success_rows: i32,

    #[serde(rename = "errorRows")]
    pub error_rows: i32,

    pub status: ImportRunStatus,

    /// JSON-массив строк табличной части (ImportRunItem)
    #[serde(rename = "itemsJson")]
    pub items_json: Option<String>,
}

impl ImportRun {
    pub fn new_for_insert(
        file_name: String,
        store_id: Option<String>,
        total_rows: i32,
        success_rows: i32,
        error_rows: i32,
        status: ImportRunStatus,
        items: &[ImportRunItem],
    ) -> Self {
        let id = ImportRunId::new_v4();
        let code = format!("IMP-{}", &id.as_string()[..8]);
        let description = format!("Импорт из файла {}", file_name);
        let items_json = if items.is_empty() {
            None
        } else {
            serde_json::to_string(items).ok()
        };

        Self {
            base: BaseAggregate::new(id, code, description),
            file_name,
            store_id,
            total_rows,
            success_rows,
            error_rows,
            status,
            items_json,
        }
    }

    /// Строки табличной части (пустой вектор, если JSON отсутствует или поврежден)
    pub fn items(&self) -> Vec<ImportRunItem> {
        self.items_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }

    /// Количество различных наименований в снимке
    pub fn distinct_product_names(&self) -> usize {
        self.items()
            .iter()
            .map(|i| i.product_name.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Суммарное количество по всем строкам снимка
    pub fn total_quantity(&self) -> f64 {
        self.items().iter().map(|i| i.quantity).sum()
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

/// DTO для записи завершенного прогона с клиента
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportRunDto {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "storeId")]
    pub store_id: Option<String>,
    #[serde(rename = "totalRows")]
    pub total_rows: i32,
    #[serde(rename = "successRows")]
    pub success_rows: i32,
    #[serde(rename = "errorRows")]
    pub error_rows: i32,
    pub status: ImportRunStatus,
    #[serde(default)]
    pub items: Vec<ImportRunItem>,
}

impl Default for ImportRunStatus {
    fn default() -> Self {
        ImportRunStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ImportRunStatus::Completed,
            ImportRunStatus::InProgress,
            ImportRunStatus::Failed,
        ] {
            assert_eq!(ImportRunStatus::from_str(status.as_str()).unwrap(), status);
        }
        // формат на проводе — snake_case строки
        assert_eq!(
            serde_json::to_string(&ImportRunStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_items_snapshot_totals() {
        let items = vec![
            ImportRunItem {
                product_id: Some("x".into()),
                product_name: "Кружка".into(),
                product_sku: "MUG-01".into(),
                barcode: None,
                quantity: 10.0,
                unit: "шт".into(),
            },
            ImportRunItem {
                product_id: Some("y".into()),
                product_name: "кружка".into(),
                product_sku: "MUG-02".into(),
                barcode: None,
                quantity: 5.0,
                unit: "шт".into(),
            },
        ];
        let run = ImportRun::new_for_insert(
            "products.xlsx".into(),
            None,
            2,
            2,
            0,
            ImportRunStatus::Completed,
            &items,
        );

        assert_eq!(run.items(), items);
        // различные наименования считаются без учета регистра
        assert_eq!(run.distinct_product_names(), 1);
        assert_eq!(run.total_quantity(), 15.0);
    }
}
