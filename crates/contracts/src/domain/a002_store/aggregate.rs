use crate::domain::common::{AggregateId, BaseAggregate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(pub Uuid);

impl StoreId {
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

impl AggregateId for StoreId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(StoreId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Магазин (точка продаж). Выбирается перед загрузкой файла импорта.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    #[serde(flatten)]
    pub base: BaseAggregate<StoreId>,

    /// Адрес точки
    pub address: Option<String>,

    /// Признак активности (неактивные не показываются в выборе)
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Store {
    pub fn new_for_insert(code: String, name: String, address: Option<String>) -> Self {
        Self {
            base: BaseAggregate::new(StoreId::new_v4(), code, name),
            address,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Название магазина не может быть пустым".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub name: String,
    pub address: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    pub comment: Option<String>,
}
