use chrono::Utc;
use contracts::domain::a001_product::{Product, ProductId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub sku: String,
    pub price: f64,
    pub stock: i64,
    pub unit: String,
    pub barcode: Option<String>,
    pub store_id: Option<String>,
    pub width_mm: f64,
    pub height_mm: f64,
    pub length_mm: f64,
    pub weight_g: f64,
    pub images_json: Option<String>,
    pub attributes_json: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        Product {
            base: BaseAggregate::with_metadata(
                ProductId::new(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            sku: m.sku,
            price: m.price,
            stock: m.stock,
            unit: m.unit,
            barcode: m.barcode,
            store_id: m.store_id,
            width_mm: m.width_mm,
            height_mm: m.height_mm,
            length_mm: m.length_mm,
            weight_g: m.weight_g,
            images_json: m.images_json,
            attributes_json: m.attributes_json,
        }
    }
}

fn to_active_model(aggregate: &Product) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        sku: Set(aggregate.sku.clone()),
        price: Set(aggregate.price),
        stock: Set(aggregate.stock),
        unit: Set(aggregate.unit.clone()),
        barcode: Set(aggregate.barcode.clone()),
        store_id: Set(aggregate.store_id.clone()),
        width_mm: Set(aggregate.width_mm),
        height_mm: Set(aggregate.height_mm),
        length_mm: Set(aggregate.length_mm),
        weight_g: Set(aggregate.weight_g),
        images_json: Set(aggregate.images_json.clone()),
        attributes_json: Set(aggregate.attributes_json.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Постраничный список товаров. `search` матчится подстрокой по
/// наименованию и артикулу; `page` — с единицы.
pub async fn list_paginated(
    page: u64,
    limit: u64,
    search: Option<&str>,
) -> anyhow::Result<(Vec<Product>, u64)> {
    let mut query = Entity::find().filter(Column::IsDeleted.eq(false));

    if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(Column::Description.contains(needle))
                .add(Column::Sku.contains(needle)),
        );
    }

    let paginator = query
        .order_by_asc(Column::Description)
        .paginate(conn(), limit);
    let total = paginator.num_items().await?;
    let items: Vec<Product> = paginator
        .fetch_page(page.saturating_sub(1))
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok((items, total))
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Product>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &Product) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active_model(aggregate).insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &Product) -> anyhow::Result<()> {
    let mut active = to_active_model(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}

pub async fn soft_delete(id: Uuid) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Найти товары по артикулу без учета регистра.
/// Фильтрация на стороне приложения для корректного trim + lowercase.
pub async fn find_by_sku_ignore_case(sku: &str) -> anyhow::Result<Vec<Product>> {
    let sku_lower = sku.trim().to_lowercase();

    let all_items: Vec<Model> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .all(conn())
        .await?;

    let items: Vec<Product> = all_items
        .into_iter()
        .filter(|m| m.sku.trim().to_lowercase() == sku_lower)
        .map(Into::into)
        .collect();

    Ok(items)
}
