use crate::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub Uuid);

impl ProductId {
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

impl AggregateId for ProductId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ProductId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================
/// Товар каталога. `base.description` хранит наименование товара.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(flatten)]
    pub base: BaseAggregate<ProductId>,

    /// Артикул (SKU)
    pub sku: String,

    /// Цена за единицу
    pub price: f64,

    /// Остаток на складе
    pub stock: i64,

    /// Единица измерения ("шт" по умолчанию)
    #[serde(default)]
    pub unit: String,

    /// Штрихкод
    pub barcode: Option<String>,

    /// Ссылка на магазин (a002_store)
    #[serde(rename = "storeId")]
    pub store_id: Option<String>,

    // Габариты — при импорте из файла заполняются нулями
    #[serde(default)]
    pub width_mm: f64,
    #[serde(default)]
    pub height_mm: f64,
    #[serde(default)]
    pub length_mm: f64,
    #[serde(default)]
    pub weight_g: f64,

    /// JSON-массив ссылок на изображения
    #[serde(rename = "imagesJson")]
    pub images_json: Option<String>,

    /// JSON-объект произвольных атрибутов
    #[serde(rename = "attributesJson")]
    pub attributes_json: Option<String>,
}

impl Product {
    pub fn new_for_insert(
        code: String,
        name: String,
        sku: String,
        price: f64,
        stock: i64,
        store_id: Option<String>,
    ) -> Self {
        Self {
            base: BaseAggregate::new(ProductId::new_v4(), code, name),
            sku,
            price,
            stock,
            unit: "шт".to_string(),
            barcode: None,
            store_id,
            width_mm: 0.0,
            height_mm: 0.0,
            length_mm: 0.0,
            weight_g: 0.0,
            images_json: None,
            attributes_json: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.base.description
    }

    pub fn update(&mut self, dto: &ProductDto) {
        if let Some(code) = &dto.code {
            self.base.code = code.clone();
        }
        self.base.description = dto.name.clone();
        self.base.comment = dto.comment.clone();
        self.sku = dto.sku.clone();
        self.price = dto.price.unwrap_or(0.0);
        self.stock = dto.stock.unwrap_or(0);
        if let Some(unit) = &dto.unit {
            self.unit = unit.clone();
        }
        self.barcode = dto.barcode.clone();
        self.store_id = dto.store_id.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Наименование не может быть пустым".into());
        }
        if self.sku.trim().is_empty() {
            return Err("Артикул не может быть пустым".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("Цена должна быть неотрицательным числом".into());
        }
        if self.stock < 0 {
            return Err("Остаток не может быть отрицательным".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

// ============================================================================
// DTO
// ============================================================================
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub name: String,
    pub sku: String,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub unit: Option<String>,
    pub barcode: Option<String>,
    #[serde(rename = "storeId")]
    pub store_id: Option<String>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_required_fields() {
        let mut p = Product::new_for_insert(
            "PRD-1".into(),
            "Кружка".into(),
            "MUG-01".into(),
            150.0,
            10,
            None,
        );
        assert!(p.validate().is_ok());

        p.sku = "   ".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut p = Product::new_for_insert("PRD-2".into(), "Тарелка".into(), "PLT-01".into(), 0.0, 0, None);
        p.price = -5.0;
        assert!(p.validate().is_err());
    }
}
