use chrono::Utc;
use contracts::shared::logger::LogEntry;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryOrder, QuerySelect, Set};

use crate::shared::data::db::get_connection;

/// Сколько последних записей хранится в system_log
pub const RETAINED_ENTRIES: i64 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "system_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: String,
    pub source: String,
    pub category: String,
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LogEntry {
    fn from(m: Model) -> Self {
        LogEntry {
            id: m.id,
            timestamp: m.timestamp,
            source: m.source,
            category: m.category,
            message: m.message,
        }
    }
}

/// Отбор записей журнала; пустые поля не ограничивают выборку
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub source: Option<String>,
    pub category: Option<String>,
    pub limit: u64,
}

impl LogFilter {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            cond = cond.add(Column::Source.eq(source));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            cond = cond.add(Column::Category.eq(category));
        }
        cond
    }
}

/// Запись в фоне: ошибка журнала не должна ронять вызывающий запрос
pub fn log_event_internal(source: &str, category: &str, message: &str) {
    let source = source.to_string();
    let category = category.to_string();
    let message = message.to_string();

    tokio::spawn(async move {
        if let Err(e) = log_event(&source, &category, &message).await {
            tracing::warn!("Failed to write system log: {}", e);
        }
    });
}

pub async fn log_event(source: &str, category: &str, message: &str) -> anyhow::Result<()> {
    let db = get_connection();
    let inserted = ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        timestamp: Set(Utc::now().to_rfc3339()),
        source: Set(source.to_string()),
        category: Set(category.to_string()),
        message: Set(message.to_string()),
    }
    .insert(db)
    .await?;

    // Старые записи срезаются по id, он монотонно растёт
    let threshold = inserted.id - RETAINED_ENTRIES;
    if threshold > 0 {
        Entity::delete_many()
            .filter(Column::Id.lte(threshold))
            .exec(db)
            .await?;
    }
    Ok(())
}

/// Последние записи по фильтру, новые сверху
pub async fn find_logs(filter: &LogFilter) -> anyhow::Result<Vec<LogEntry>> {
    Ok(Entity::find()
        .filter(filter.condition())
        .order_by_desc(Column::Id)
        .limit(filter.limit)
        .all(get_connection())
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn clear_all_logs() -> anyhow::Result<u64> {
    let res = Entity::delete_many().exec(get_connection()).await?;
    Ok(res.rows_affected)
}
