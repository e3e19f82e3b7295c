use chrono::{DateTime, Utc};
use contracts::domain::a001_category::aggregate::{Category, CategoryLocalization, CategoryType};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub category_type: String,
    pub path: String,
    pub parent_path: Option<String>,
    pub display_order: i32,
    pub level: i32,
    pub is_active: bool,
    pub icon_name: Option<String>,
    pub image_id: Option<String>,
    /// JSON-массив локализаций
    pub localizations: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Category {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let category_type = CategoryType::parse(&m.category_type)
            .ok_or_else(|| anyhow::anyhow!("Unknown category type '{}'", m.category_type))?;
        let localizations: Vec<CategoryLocalization> = serde_json::from_str(&m.localizations)
            .map_err(|e| anyhow::anyhow!("Bad localizations for category {}: {}", m.id, e))?;
        Ok(Category {
            category_id: m.id,
            path: m.path,
            parent_path: m.parent_path,
            display_order: m.display_order,
            level: m.level,
            category_type,
            is_active: m.is_active,
            icon_name: m.icon_name,
            image_id: m.image_id,
            localizations,
        })
    }
}

fn sort_tree(items: &mut [Category]) {
    items.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then_with(|| a.parent_path.cmp(&b.parent_path))
            .then_with(|| a.display_order.cmp(&b.display_order))
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Все категории типа, от корней к листьям
pub async fn list_by_type<C: ConnectionTrait>(
    db: &C,
    category_type: CategoryType,
) -> anyhow::Result<Vec<Category>> {
    let mut items = Entity::find()
        .filter(Column::CategoryType.eq(category_type.as_str()))
        .order_by_asc(Column::Level)
        .all(db)
        .await?
        .into_iter()
        .map(Category::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    sort_tree(&mut items);
    Ok(items)
}

/// Даты создания существующих категорий, чтобы не потерять их при перезаписи дерева
pub async fn created_at_by_id<C: ConnectionTrait>(
    db: &C,
    category_type: CategoryType,
) -> anyhow::Result<HashMap<String, DateTime<Utc>>> {
    let models = Entity::find()
        .filter(Column::CategoryType.eq(category_type.as_str()))
        .all(db)
        .await?;
    Ok(models
        .into_iter()
        .filter_map(|m| m.created_at.map(|at| (m.id, at)))
        .collect())
}

pub async fn delete_by_type<C: ConnectionTrait>(
    db: &C,
    category_type: CategoryType,
) -> anyhow::Result<u64> {
    let result = Entity::delete_many()
        .filter(Column::CategoryType.eq(category_type.as_str()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    category: &Category,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(category.category_id.clone()),
        category_type: Set(category.category_type.as_str().to_string()),
        path: Set(category.path.clone()),
        parent_path: Set(category.parent_path.clone()),
        display_order: Set(category.display_order),
        level: Set(category.level),
        is_active: Set(category.is_active),
        icon_name: Set(category.icon_name.clone()),
        image_id: Set(category.image_id.clone()),
        localizations: Set(serde_json::to_string(&category.localizations)?),
        created_at: Set(Some(created_at)),
        updated_at: Set(Some(updated_at)),
    };
    active.insert(db).await?;
    Ok(())
}
