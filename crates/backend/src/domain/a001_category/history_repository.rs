use chrono::{DateTime, Utc};
use contracts::domain::a001_category::aggregate::{Category, CategoryType};
use contracts::domain::a001_category::history::CategoryHistoryEntry;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_category_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category_type: String,
    pub change_description: String,
    pub changed_at: DateTime<Utc>,
    pub category_count: i32,
    /// JSON-снимок всего дерева после изменения
    pub snapshot: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn entry(&self) -> anyhow::Result<CategoryHistoryEntry> {
        let category_type = CategoryType::parse(&self.category_type)
            .ok_or_else(|| anyhow::anyhow!("Unknown category type '{}'", self.category_type))?;
        Ok(CategoryHistoryEntry {
            id: self.id,
            category_type,
            change_description: self.change_description.clone(),
            changed_at: self.changed_at,
            category_count: self.category_count.max(0) as usize,
        })
    }

    pub fn categories(&self) -> anyhow::Result<Vec<Category>> {
        serde_json::from_str(&self.snapshot)
            .map_err(|e| anyhow::anyhow!("Corrupted history snapshot #{}: {}", self.id, e))
    }
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    category_type: CategoryType,
    change_description: &str,
    categories: &[Category],
) -> anyhow::Result<i64> {
    let active = ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        category_type: Set(category_type.as_str().to_string()),
        change_description: Set(change_description.to_string()),
        changed_at: Set(Utc::now()),
        category_count: Set(categories.len() as i32),
        snapshot: Set(serde_json::to_string(categories)?),
    };
    let model = active.insert(db).await?;
    Ok(model.id)
}

pub async fn list_by_type<C: ConnectionTrait>(
    db: &C,
    category_type: CategoryType,
) -> anyhow::Result<Vec<CategoryHistoryEntry>> {
    Entity::find()
        .filter(Column::CategoryType.eq(category_type.as_str()))
        .order_by_desc(Column::Id)
        .all(db)
        .await?
        .iter()
        .map(Model::entry)
        .collect()
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i64) -> anyhow::Result<Option<Model>> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Предыдущий снимок того же типа
pub async fn get_previous<C: ConnectionTrait>(db: &C, entry: &Model) -> anyhow::Result<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::CategoryType.eq(entry.category_type.clone()))
        .filter(Column::Id.lt(entry.id))
        .order_by_desc(Column::Id)
        .one(db)
        .await?)
}
